//! Native output shapes of the two supported engine families and their
//! normalization into [`Detection`] records.

use serde::Deserialize;

use crate::engine::OcrError;
use crate::region::Detection;

/// Tesseract reports confidence on a 0-100 scale.
const TOKEN_CONFIDENCE_SCALE: f32 = 100.0;

/// A corner point as `[x, y]`.
pub type Point = [f64; 2];

/// One EasyOCR-style detection: a quadrilateral, its text and a probability.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left. The
/// JSON form is the `readtext` triple `[[[x,y],...], "text", prob]`; serde
/// accepts a struct from a sequence in field order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuadDetection {
    pub corners: [Point; 4],
    pub text: String,
    pub probability: f64,
}

impl QuadDetection {
    pub fn new(corners: [Point; 4], text: impl Into<String>, probability: f64) -> Self {
        Self {
            corners,
            text: text.into(),
            probability,
        }
    }

    /// Reduces the quadrilateral to an axis-aligned box anchored at the
    /// top-left corner. Float-to-integer casts truncate and saturate at zero.
    pub fn into_detection(self) -> Detection {
        let [top_left, _, bottom_right, _] = self.corners;
        Detection {
            text: self.text,
            x: top_left[0] as u32,
            y: top_left[1] as u32,
            width: (bottom_right[0] - top_left[0]) as u32,
            height: (bottom_right[1] - top_left[1]) as u32,
            confidence: Some(self.probability as f32),
        }
    }
}

/// Normalizes EasyOCR-style output, preserving engine order.
pub fn normalize_quads(raw: Vec<QuadDetection>) -> Vec<Detection> {
    raw.into_iter().map(QuadDetection::into_detection).collect()
}

/// Tesseract-style output: one column per field, rows aligned by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTable {
    pub text: Vec<String>,
    pub left: Vec<i64>,
    pub top: Vec<i64>,
    pub width: Vec<i64>,
    pub height: Vec<i64>,
    pub conf: Vec<f32>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one row across all columns.
    pub fn push(
        &mut self,
        text: impl Into<String>,
        left: i64,
        top: i64,
        width: i64,
        height: i64,
        conf: f32,
    ) {
        self.text.push(text.into());
        self.left.push(left);
        self.top.push(top);
        self.width.push(width);
        self.height.push(height);
        self.conf.push(conf);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn check_columns(&self) -> Result<(), OcrError> {
        let rows = self.text.len();
        let columns = [
            ("left", self.left.len()),
            ("top", self.top.len()),
            ("width", self.width.len()),
            ("height", self.height.len()),
            ("conf", self.conf.len()),
        ];
        for (name, len) in columns {
            if len != rows {
                return Err(OcrError::Engine(format!(
                    "token table column `{name}` has {len} entries, expected {rows}"
                )));
            }
        }
        Ok(())
    }
}

/// Normalizes Tesseract-style output.
///
/// Rows with a negative confidence or blank text are placeholders for
/// layout levels (page, block, line) and are dropped. The text itself is
/// kept as reported.
pub fn normalize_tokens(table: TokenTable) -> Result<Vec<Detection>, OcrError> {
    table.check_columns()?;

    let TokenTable {
        text,
        left,
        top,
        width,
        height,
        conf,
    } = table;

    let detections = text
        .into_iter()
        .enumerate()
        .filter(|(i, text)| conf[*i] >= 0.0 && !text.trim().is_empty())
        .map(|(i, text)| Detection {
            text,
            x: saturate(left[i]),
            y: saturate(top[i]),
            width: saturate(width[i]),
            height: saturate(height[i]),
            confidence: Some(conf[i] / TOKEN_CONFIDENCE_SCALE),
        })
        .collect();

    Ok(detections)
}

fn saturate(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}
