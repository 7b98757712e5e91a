use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::engine::{OcrError, QuadDetector};
use crate::process::{png_bytes, run_with_stdin};
use crate::raw::QuadDetection;

/// An EasyOCR-compatible engine behind an external command.
///
/// The command receives the image as PNG on stdin and must print the
/// `readtext` result as JSON: `[[[[x,y],[x,y],[x,y],[x,y]], "text", prob], ...]`.
#[derive(Debug, Clone)]
pub struct QuadCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl QuadCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl QuadDetector for QuadCommand {
    fn detect_quads(&self, image: &DynamicImage) -> Result<Vec<QuadDetection>, OcrError> {
        let png = png_bytes(image)?;
        debug!(program = %self.program.display(), bytes = png.len(), "invoking quad detector");
        let stdout = run_with_stdin(&self.program, &self.args, &png)?;
        serde_json::from_slice(&stdout).map_err(|e| {
            OcrError::Engine(format!(
                "{} printed invalid detections: {e}",
                self.program.display()
            ))
        })
    }
}
