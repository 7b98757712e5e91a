use base64plus_ocr::OcrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Base64PlusError {
    /// No OCR engine was registered at all.
    #[error("no OCR engine is available: install Tesseract or configure an EasyOCR command")]
    Dependency,
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("unsupported image format: {0:?} (expected png, jpeg or jpg)")]
    UnsupportedFormat(String),
    #[error("invalid Base64Plus envelope: {0}")]
    MalformedEnvelope(String),
    /// Detections handed to the encoder disagree on whether they carry a
    /// confidence score.
    #[error("detections must all carry a confidence score or none may: {0}")]
    MixedConfidence(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Base64PlusError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Base64PlusError::MalformedEnvelope(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Base64PlusError>;
