//! # base64plus
//!
//! Bundles an image, the text found in it and the position of every text
//! region into a single JSON envelope, and reads such envelopes back.
//!
//! ## Envelope
//!
//! ```json
//! {
//!   "image": "<standard base64>",
//!   "text_data": [
//!     {"text": "Invoice", "x": 10, "y": 20, "width": 40, "height": 60, "confidence": 0.87}
//!   ],
//!   "format": "png"
//! }
//! ```
//!
//! `confidence` is omitted entirely when the producer opts out of it.
//! `format` is `png` or `jpeg`; decoders sniff the real format from the bytes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use base64plus::prelude::*;
//!
//! // Register the engines this machine has, once.
//! let adapter = Config::default().build_adapter();
//! let encoder = Encoder::new(adapter);
//!
//! let json = encoder.encode_path("scan.jpg", &EncodeOptions::default())?;
//!
//! let decoded = decode(&json)?;
//! for detection in decoded.detections()? {
//!     println!("{} at ({}, {})", detection.text, detection.x, detection.y);
//! }
//! ```

pub mod config;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod format;
pub mod source;

pub use base64plus_ocr::{
    Detection, EngineKind, EngineSelector, OcrAdapter, OcrError, QuadCommand, QuadDetection,
    QuadDetector, TesseractCli, TokenDetector, TokenTable,
};
pub use config::{Config, EncodeOverrides};
pub use encoder::{EncodeOptions, Encoder};
pub use envelope::{decode, encode, encode_image, DecodedEnvelope, Envelope};
pub use error::{Base64PlusError, Result};
pub use format::EnvelopeFormat;
pub use source::SourceImage;

/// Prelude module for convenient imports
///
/// ```ignore
/// use base64plus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        decode, encode, Base64PlusError, Config, DecodedEnvelope, Detection, EncodeOptions,
        Encoder, EngineKind, EngineSelector, Envelope, EnvelopeFormat, OcrAdapter, SourceImage,
    };
}
