//! Raster overlay sink.
//!
//! `RasterCanvas` paints box outlines and label backgrounds into an RGBA image
//! that can be composited over the displayed-size source image. No font is
//! bundled, so `fill_text` is a no-op here; label text reaches the browser via
//! `RecordingCanvas` instead.

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::detection::FrameSize;
use crate::overlay::{CanvasSink, Color, Font, Rect, AVG_GLYPH_ADVANCE};

pub struct RasterCanvas {
    image: RgbaImage,
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCanvas {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Resizes `base` to the canvas size and lays the overlay on top.
    pub fn composite_over(&self, base: &DynamicImage) -> RgbaImage {
        let (width, height) = self.image.dimensions();
        let mut out = base
            .resize_exact(width, height, imageops::FilterType::Triangle)
            .into_rgba8();
        imageops::overlay(&mut out, &self.image, 0, 0);
        out
    }

    fn pixel_bounds(&self, rect: Rect) -> Option<[u32; 4]> {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        let clamp = |v: f64, max: u32| -> u32 { v.round().max(0.0).min((max - 1) as f64) as u32 };
        let x0 = clamp(rect.x, w);
        let y0 = clamp(rect.y, h);
        let x1 = clamp(rect.x + rect.width, w);
        let y1 = clamp(rect.y + rect.height, h);
        let outside = rect.x >= w as f64
            || rect.y >= h as f64
            || rect.x + rect.width < 0.0
            || rect.y + rect.height < 0.0;
        if outside || x0 > x1 || y0 > y1 {
            return None;
        }
        Some([x0, y0, x1, y1])
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let [r, g, b, a] = color.0;
        if a == 255 {
            self.image.put_pixel(x, y, Rgba([r, g, b, a]));
            return;
        }
        let dst = self.image.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let mix =
            |src: u8, dst: u8| -> u8 { (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8 };
        let out_a = (a as f32 + dst[3] as f32 * (1.0 - alpha)).round() as u8;
        self.image
            .put_pixel(x, y, Rgba([mix(r, dst[0]), mix(g, dst[1]), mix(b, dst[2]), out_a]));
    }
}

impl CanvasSink for RasterCanvas {
    fn resize(&mut self, size: FrameSize) {
        self.image = RgbaImage::new(size.width, size.height);
    }

    fn size(&self) -> FrameSize {
        let (width, height) = self.image.dimensions();
        FrameSize::new(width, height)
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) {
        let Some([x0, y0, x1, y1]) = self.pixel_bounds(rect) else {
            return;
        };
        let thickness = line_width.round().max(1.0) as u32;
        for t in 0..thickness {
            let xx0 = x0.saturating_add(t);
            let yy0 = y0.saturating_add(t);
            let xx1 = x1.saturating_sub(t);
            let yy1 = y1.saturating_sub(t);
            if xx0 > xx1 || yy0 > yy1 {
                break;
            }
            for x in xx0..=xx1 {
                self.blend(x, yy0, color);
                self.blend(x, yy1, color);
            }
            for y in yy0..=yy1 {
                self.blend(xx0, y, color);
                self.blend(xx1, y, color);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some([x0, y0, x1, y1]) = self.pixel_bounds(rect) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn measure_text(&self, text: &str, font: &Font) -> f64 {
        text.chars().count() as f64 * font.px * AVG_GLYPH_ADVANCE
    }

    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64, _font: &Font, _color: Color) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_paints_corners() {
        let mut canvas = RasterCanvas::new();
        canvas.resize(FrameSize::new(40, 40));
        let green = Color::rgb(0, 255, 0);
        canvas.stroke_rect(
            Rect {
                x: 5.0,
                y: 5.0,
                width: 5.0,
                height: 5.0,
            },
            green,
            2.0,
        );
        let expected = Rgba([0, 255, 0, 255]);
        assert_eq!(canvas.image().get_pixel(5, 5), &expected);
        assert_eq!(canvas.image().get_pixel(10, 5), &expected);
        assert_eq!(canvas.image().get_pixel(5, 10), &expected);
        assert_eq!(canvas.image().get_pixel(10, 10), &expected);
        assert_eq!(canvas.image().get_pixel(20, 20), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn rects_outside_the_canvas_are_ignored() {
        let mut canvas = RasterCanvas::new();
        canvas.resize(FrameSize::new(10, 10));
        canvas.fill_rect(
            Rect {
                x: -30.0,
                y: -30.0,
                width: 5.0,
                height: 5.0,
            },
            Color::rgb(255, 0, 0),
        );
        assert!(canvas.image().pixels().all(|p| p.0[3] == 0));
    }
}
