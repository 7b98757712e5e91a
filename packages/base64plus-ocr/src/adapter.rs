use image::DynamicImage;
use tracing::debug;

use crate::engine::{EngineKind, EngineSelector, OcrBackend, OcrError, QuadDetector, TokenDetector};
use crate::region::Detection;

/// The set of engines available to this process, fixed at construction.
#[derive(Debug, Default)]
pub struct OcrAdapter {
    backends: Vec<OcrBackend>,
}

impl OcrAdapter {
    pub fn builder() -> OcrAdapterBuilder {
        OcrAdapterBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Registered engines in preference order.
    pub fn available(&self) -> Vec<EngineKind> {
        EngineKind::PREFERENCE
            .into_iter()
            .filter(|kind| self.backend(*kind).is_some())
            .collect()
    }

    pub fn backend(&self, kind: EngineKind) -> Option<&OcrBackend> {
        self.backends.iter().find(|backend| backend.kind() == kind)
    }

    /// Resolves a selector to a registered engine. `auto` prefers EasyOCR.
    pub fn select(&self, selector: EngineSelector) -> Result<&OcrBackend, OcrError> {
        let found = match selector {
            EngineSelector::Auto => EngineKind::PREFERENCE
                .into_iter()
                .find_map(|kind| self.backend(kind)),
            EngineSelector::Engine(kind) => self.backend(kind),
        };
        found.ok_or(OcrError::UnavailableEngine(selector))
    }

    pub fn recognize(
        &self,
        image: &DynamicImage,
        selector: EngineSelector,
    ) -> Result<Vec<Detection>, OcrError> {
        let backend = self.select(selector)?;
        debug!(requested = %selector, engine = %backend.kind(), "running OCR");
        let detections = backend.detect(image)?;
        debug!(engine = %backend.kind(), regions = detections.len(), "OCR finished");
        Ok(detections)
    }
}

#[derive(Debug, Default)]
pub struct OcrAdapterBuilder {
    backends: Vec<OcrBackend>,
}

impl OcrAdapterBuilder {
    /// Registers an EasyOCR-shaped engine, replacing any earlier one.
    pub fn quad(self, detector: impl QuadDetector + 'static) -> Self {
        self.backend(OcrBackend::Quad(Box::new(detector)))
    }

    /// Registers a Tesseract-shaped engine, replacing any earlier one.
    pub fn token(self, detector: impl TokenDetector + 'static) -> Self {
        self.backend(OcrBackend::Token(Box::new(detector)))
    }

    pub fn backend(mut self, backend: OcrBackend) -> Self {
        self.backends.retain(|existing| existing.kind() != backend.kind());
        self.backends.push(backend);
        self
    }

    pub fn build(self) -> OcrAdapter {
        OcrAdapter {
            backends: self.backends,
        }
    }
}
