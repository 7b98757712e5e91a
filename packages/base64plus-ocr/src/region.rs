use serde::{Deserialize, Serialize};

/// One recognized text region in the uniform shape shared by every engine.
///
/// Coordinates are integer pixels measured from the top-left corner of the
/// image. `confidence` is in `[0.0, 1.0]` and is omitted from the serialized
/// form when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(text: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Drops the confidence score, leaving the box and text untouched.
    pub fn without_confidence(mut self) -> Self {
        self.confidence = None;
        self
    }
}
