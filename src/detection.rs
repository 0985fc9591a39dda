use serde::{Deserialize, Serialize};

/// One server-reported trash classification.
///
/// Results are transient: they are rebuilt from every server response and never
/// mutated after parsing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub trash_type: String,
    /// Confidence in 0..=1.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

/// Rectangle in source-resolution pixels (natural image/frame size, never the
/// displayed size).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "w")]
    pub width: f64,
    #[serde(alias = "h")]
    pub height: f64,
}

/// Pixel dimensions of a frame, image, or canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size after scaling to `width` while keeping the aspect ratio.
    pub fn fit_width(&self, width: u32) -> FrameSize {
        if self.width == 0 {
            return FrameSize::new(width, 0);
        }
        let height = (self.height as f64 * width as f64 / self.width as f64).round() as u32;
        FrameSize::new(width, height)
    }
}

/// Colour class of a confidence value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceLevel {
    Success,
    Warning,
    Danger,
}

const SUCCESS_THRESHOLD: f64 = 0.70;
const WARNING_THRESHOLD: f64 = 0.40;

impl ConfidenceLevel {
    /// Classifies the raw confidence. A value just under a threshold keeps the
    /// lower level even when its two-decimal percentage rounds up to it.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= SUCCESS_THRESHOLD {
            ConfidenceLevel::Success
        } else if confidence >= WARNING_THRESHOLD {
            ConfidenceLevel::Warning
        } else {
            ConfidenceLevel::Danger
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfidenceLevel::Success => "success",
            ConfidenceLevel::Warning => "warning",
            ConfidenceLevel::Danger => "danger",
        }
    }

    pub fn text_class(&self) -> String {
        format!("text-{}", self.name())
    }

    pub fn bar_class(&self) -> String {
        format!("bg-{}", self.name())
    }
}

impl DetectionResult {
    pub fn new(trash_type: impl Into<String>, confidence: f64) -> Self {
        Self {
            trash_type: trash_type.into(),
            confidence,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }

    /// Percentage with `decimals` fractional digits, e.g. `92.00`.
    pub fn percent(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self.confidence * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_boundaries_are_inclusive() {
        assert_eq!(ConfidenceLevel::from_confidence(0.70), ConfidenceLevel::Success);
        assert_eq!(ConfidenceLevel::from_confidence(0.6999), ConfidenceLevel::Warning);
        assert_eq!(ConfidenceLevel::from_confidence(0.40), ConfidenceLevel::Warning);
        assert_eq!(ConfidenceLevel::from_confidence(0.3999), ConfidenceLevel::Danger);
        assert_eq!(ConfidenceLevel::from_confidence(0.0), ConfidenceLevel::Danger);
        assert_eq!(ConfidenceLevel::from_confidence(1.0), ConfidenceLevel::Success);
    }

    #[test]
    fn colour_uses_raw_confidence_not_rounded_percentage() {
        let result = DetectionResult::new("Can", 0.69999);
        assert_eq!(result.percent(2), "70.00");
        assert_eq!(result.level(), ConfidenceLevel::Warning);
        assert_eq!(ConfidenceLevel::from_confidence(0.69995), ConfidenceLevel::Warning);
        assert_eq!(ConfidenceLevel::from_confidence(0.39999), ConfidenceLevel::Danger);
        assert_eq!(ConfidenceLevel::from_confidence(0.399999), ConfidenceLevel::Danger);
    }

    #[test]
    fn bbox_accepts_short_field_names() {
        let json = r#"{"trash_type":"Bottle","confidence":0.92,"bbox":{"x":10,"y":12,"w":50,"h":40}}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        let bbox = result.bbox.unwrap();
        assert_eq!(bbox.width, 50.0);
        assert_eq!(bbox.height, 40.0);

        let json = r#"{"trash_type":"Bag","confidence":0.5}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        assert!(result.bbox.is_none());
    }

    #[test]
    fn fit_width_keeps_aspect() {
        assert_eq!(FrameSize::new(1280, 720).fit_width(640), FrameSize::new(640, 360));
        assert!(FrameSize::new(0, 720).fit_width(640).is_empty());
    }
}
