//! Bounding-box overlay.
//!
//! One drawing routine serves still images, uploaded-image previews and live
//! video. The caller supplies the anchor's displayed size and its intrinsic
//! (natural) size; boxes arrive in natural pixels and are rescaled by
//! `displayed / natural` before painting onto a `CanvasSink`.

use serde::Serialize;

use crate::detection::{BoundingBox, DetectionResult, FrameSize};

/// RGBA colour, alpha 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color([r, g, b, a])
    }

    /// CSS colour string, e.g. `rgba(0, 255, 0, 0.70)`.
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("rgba({r}, {g}, {b}, {:.2})", a as f64 / 255.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Font {
    pub px: f64,
    pub family: String,
}

impl Font {
    pub fn to_css(&self) -> String {
        format!("{}px {}", self.px, self.family)
    }
}

/// Minimal 2D drawing surface, shaped after the browser canvas context.
pub trait CanvasSink {
    /// Sets the backing size. Resizing discards everything drawn so far.
    fn resize(&mut self, size: FrameSize);
    fn size(&self) -> FrameSize;
    fn clear(&mut self);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn measure_text(&self, text: &str, font: &Font) -> f64;
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &Font, color: Color);
}

/// The visual element boxes are aligned to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    /// Size currently on screen.
    pub displayed: FrameSize,
    /// Intrinsic media resolution, if the media has loaded.
    pub intrinsic: Option<FrameSize>,
}

impl Anchor {
    pub fn new(displayed: FrameSize, intrinsic: Option<FrameSize>) -> Self {
        Self {
            displayed,
            intrinsic,
        }
    }

    /// Intrinsic size, falling back to the displayed size when unknown or zero.
    pub fn natural(&self) -> FrameSize {
        match self.intrinsic {
            Some(size) if !size.is_empty() => size,
            _ => self.displayed,
        }
    }
}

/// A canvas plus what it should line up with.
pub struct OverlaySurface<'a> {
    pub anchor: Option<Anchor>,
    pub canvas: &'a mut dyn CanvasSink,
    /// Canvas size to use when clearing without an anchor.
    pub fallback: Option<FrameSize>,
}

impl<'a> OverlaySurface<'a> {
    pub fn new(anchor: Anchor, canvas: &'a mut dyn CanvasSink) -> Self {
        Self {
            anchor: Some(anchor),
            canvas,
            fallback: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    pub box_color: Color,
    pub line_width: f64,
    pub label_fill: Color,
    pub text_color: Color,
    pub font: Font,
    /// Horizontal padding added to the measured label width.
    pub label_padding: f64,
    pub label_height: f64,
    pub confidence_decimals: usize,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: Color::rgb(0, 255, 0),
            line_width: 2.0,
            label_fill: Color::rgba(0, 255, 0, 179),
            text_color: Color::rgb(0, 0, 0),
            font: Font {
                px: 12.0,
                family: "Arial".to_string(),
            },
            label_padding: 10.0,
            label_height: 18.0,
            confidence_decimals: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// Number of boxes painted.
    Drawn(usize),
    Cleared,
    /// Natural size was zero; canvas cleared instead of drawing.
    Skipped,
}

#[derive(Clone, Debug, Default)]
pub struct OverlayDrawer {
    style: OverlayStyle,
}

impl OverlayDrawer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Paints one box and label per result carrying a bbox, in input order.
    pub fn draw(
        &self,
        results: &[DetectionResult],
        anchor: &Anchor,
        canvas: &mut dyn CanvasSink,
    ) -> OverlayOutcome {
        canvas.resize(anchor.displayed);

        let natural = anchor.natural();
        if natural.is_empty() {
            log::warn!("overlay anchor has zero natural size; clearing instead of drawing");
            canvas.clear();
            return OverlayOutcome::Skipped;
        }

        canvas.clear();
        let mut drawn = 0;
        for result in results {
            let Some(bbox) = &result.bbox else {
                continue;
            };
            let rect = scale_box(bbox, natural, anchor.displayed);
            self.paint_box(result, rect, canvas);
            drawn += 1;
        }
        OverlayOutcome::Drawn(drawn)
    }

    /// `draw` for a surface; without an anchor the surface is only cleared.
    pub fn draw_on(&self, results: &[DetectionResult], surface: OverlaySurface<'_>) -> OverlayOutcome {
        match surface.anchor {
            Some(anchor) => self.draw(results, &anchor, surface.canvas),
            None => {
                log::warn!("overlay requested without an anchor element");
                self.clear(surface)
            }
        }
    }

    /// Sizes the canvas to the anchor (or the fallback size) and wipes it.
    pub fn clear(&self, surface: OverlaySurface<'_>) -> OverlayOutcome {
        let size = match surface.anchor {
            Some(anchor) if !anchor.displayed.is_empty() => Some(anchor.displayed),
            Some(_) => None,
            None => surface.fallback,
        };
        if let Some(size) = size {
            surface.canvas.resize(size);
        }
        surface.canvas.clear();
        OverlayOutcome::Cleared
    }

    fn paint_box(&self, result: &DetectionResult, rect: Rect, canvas: &mut dyn CanvasSink) {
        let style = &self.style;
        canvas.stroke_rect(rect, style.box_color, style.line_width);

        let label = format!(
            "{} {}%",
            result.trash_type,
            result.percent(style.confidence_decimals)
        );
        let label_width = canvas.measure_text(&label, &style.font) + style.label_padding;
        canvas.fill_rect(
            Rect {
                x: rect.x,
                y: rect.y - style.label_height,
                width: label_width,
                height: style.label_height,
            },
            style.label_fill,
        );
        canvas.fill_text(
            &label,
            rect.x + style.label_padding / 2.0,
            rect.y - 5.0,
            &style.font,
            style.text_color,
        );
    }
}

/// Maps a natural-pixel box into displayed pixels.
pub fn scale_box(bbox: &BoundingBox, natural: FrameSize, displayed: FrameSize) -> Rect {
    let scale_x = displayed.width as f64 / natural.width as f64;
    let scale_y = displayed.height as f64 / natural.height as f64;
    Rect {
        x: bbox.x * scale_x,
        y: bbox.y * scale_y,
        width: bbox.width * scale_x,
        height: bbox.height * scale_y,
    }
}

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasCommand {
    Resize { width: u32, height: u32 },
    Clear,
    StrokeRect { rect: Rect, color: String, line_width: f64 },
    FillRect { rect: Rect, color: String },
    FillText { text: String, x: f64, y: f64, font: String, color: String },
}

/// Sink that records drawing calls so they can be inspected or replayed onto a
/// browser canvas.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    size: FrameSize,
    commands: Vec<CanvasCommand>,
}

/// Average glyph advance of a proportional sans-serif font, as a fraction of
/// the font size.
pub(crate) const AVG_GLYPH_ADVANCE: f64 = 0.6;

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[CanvasCommand] {
        &self.commands
    }

    pub fn stroked_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                CanvasCommand::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                CanvasCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.commands)
    }
}

impl CanvasSink for RecordingCanvas {
    fn resize(&mut self, size: FrameSize) {
        self.size = size;
        self.commands.clear();
        self.commands.push(CanvasCommand::Resize {
            width: size.width,
            height: size.height,
        });
    }

    fn size(&self) -> FrameSize {
        self.size
    }

    fn clear(&mut self) {
        self.commands
            .retain(|command| matches!(command, CanvasCommand::Resize { .. }));
        self.commands.push(CanvasCommand::Clear);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        self.commands.push(CanvasCommand::StrokeRect {
            rect,
            color: color.to_css(),
            line_width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(CanvasCommand::FillRect {
            rect,
            color: color.to_css(),
        });
    }

    fn measure_text(&self, text: &str, font: &Font) -> f64 {
        text.chars().count() as f64 * font.px * AVG_GLYPH_ADVANCE
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &Font, color: Color) {
        self.commands.push(CanvasCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font: font.to_css(),
            color: color.to_css(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_colours() {
        assert_eq!(Color::rgb(0, 255, 0).to_css(), "#00FF00");
        assert_eq!(Color::rgba(0, 255, 0, 179).to_css(), "rgba(0, 255, 0, 0.70)");
    }

    #[test]
    fn natural_falls_back_to_displayed() {
        let anchor = Anchor::new(FrameSize::new(320, 240), Some(FrameSize::new(0, 0)));
        assert_eq!(anchor.natural(), FrameSize::new(320, 240));
        let anchor = Anchor::new(FrameSize::new(320, 240), None);
        assert_eq!(anchor.natural(), FrameSize::new(320, 240));
    }

    #[test]
    fn clear_keeps_only_resize() {
        let mut canvas = RecordingCanvas::new();
        canvas.resize(FrameSize::new(10, 10));
        canvas.fill_rect(
            Rect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            Color::rgb(1, 2, 3),
        );
        canvas.clear();
        assert_eq!(
            canvas.commands(),
            &[
                CanvasCommand::Resize {
                    width: 10,
                    height: 10
                },
                CanvasCommand::Clear
            ]
        );
    }
}
