use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use thiserror::Error;

use crate::raw::{normalize_quads, normalize_tokens, QuadDetection, TokenTable};
use crate::region::Detection;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("unsupported OCR engine: {0:?} (expected easyocr, tesseract or auto)")]
    UnsupportedEngine(String),
    #[error("no available OCR engine for `{0}`")]
    UnavailableEngine(EngineSelector),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    Engine(String),
}

/// The two engine families the adapter knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Quadrilateral output (EasyOCR `readtext`).
    EasyOcr,
    /// Parallel-column output (Tesseract `image_to_data`).
    Tesseract,
}

impl EngineKind {
    /// Order in which `auto` tries engines.
    pub const PREFERENCE: [EngineKind; 2] = [EngineKind::EasyOcr, EngineKind::Tesseract];

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::EasyOcr => "easyocr",
            EngineKind::Tesseract => "tesseract",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which engine a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineSelector {
    #[default]
    Auto,
    Engine(EngineKind),
}

impl fmt::Display for EngineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSelector::Auto => f.write_str("auto"),
            EngineSelector::Engine(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for EngineSelector {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EngineSelector::Auto),
            "easyocr" | "enginea" => Ok(EngineSelector::Engine(EngineKind::EasyOcr)),
            "tesseract" | "engineb" => Ok(EngineSelector::Engine(EngineKind::Tesseract)),
            _ => Err(OcrError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl From<EngineKind> for EngineSelector {
    fn from(kind: EngineKind) -> Self {
        EngineSelector::Engine(kind)
    }
}

/// An external engine producing EasyOCR-shaped output.
pub trait QuadDetector: Send + Sync {
    fn detect_quads(&self, image: &DynamicImage) -> Result<Vec<QuadDetection>, OcrError>;
}

/// An external engine producing Tesseract-shaped output.
pub trait TokenDetector: Send + Sync {
    fn detect_tokens(&self, image: &DynamicImage) -> Result<TokenTable, OcrError>;
}

/// A registered engine. Each variant knows how to normalize its own output.
pub enum OcrBackend {
    Quad(Box<dyn QuadDetector>),
    Token(Box<dyn TokenDetector>),
}

impl OcrBackend {
    pub fn kind(&self) -> EngineKind {
        match self {
            OcrBackend::Quad(_) => EngineKind::EasyOcr,
            OcrBackend::Token(_) => EngineKind::Tesseract,
        }
    }

    /// Runs the engine and normalizes its output. Engine failures are
    /// returned unchanged.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, OcrError> {
        match self {
            OcrBackend::Quad(detector) => Ok(normalize_quads(detector.detect_quads(image)?)),
            OcrBackend::Token(detector) => normalize_tokens(detector.detect_tokens(image)?),
        }
    }
}

impl fmt::Debug for OcrBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OcrBackend").field(&self.kind()).finish()
    }
}
