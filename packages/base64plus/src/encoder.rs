use std::path::Path;

use base64plus_ocr::{EngineSelector, OcrAdapter};
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{Base64PlusError, Result};
use crate::format::EnvelopeFormat;
use crate::source::SourceImage;

/// Options for one encode call.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub engine: EngineSelector,
    pub include_confidence: bool,
    /// `None` keeps the source format (PNG when the source is neither PNG nor JPEG).
    pub format: Option<EnvelopeFormat>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            engine: EngineSelector::Auto,
            include_confidence: true,
            format: None,
        }
    }
}

/// Runs OCR over an image and packs the result into an envelope.
#[derive(Debug)]
pub struct Encoder {
    adapter: OcrAdapter,
}

impl Encoder {
    pub fn new(adapter: OcrAdapter) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &OcrAdapter {
        &self.adapter
    }

    pub fn encode_source(&self, source: &SourceImage, options: &EncodeOptions) -> Result<Envelope> {
        self.ensure_engines()?;
        let detections = self.adapter.recognize(source.image(), options.engine)?;
        Envelope::from_source(source, detections, options.format, options.include_confidence)
    }

    /// Encodes the image file at `path` and returns the envelope JSON.
    pub fn encode_path<P: AsRef<Path>>(&self, path: P, options: &EncodeOptions) -> Result<String> {
        self.ensure_engines()?;
        let path = path.as_ref();
        debug!(path = %path.display(), "encoding image file");
        let source = SourceImage::open(path)?;
        self.encode_source(&source, options)?.to_json()
    }

    pub fn encode_bytes(&self, bytes: &[u8], options: &EncodeOptions) -> Result<String> {
        self.ensure_engines()?;
        let source = SourceImage::from_bytes(bytes)?;
        self.encode_source(&source, options)?.to_json()
    }

    // Checked before any image work so a missing install fails fast.
    fn ensure_engines(&self) -> Result<()> {
        if self.adapter.is_empty() {
            return Err(Base64PlusError::Dependency);
        }
        Ok(())
    }
}
