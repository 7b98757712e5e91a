pub mod adapter;
pub mod command;
pub mod engine;
pub mod raw;
pub mod region;
pub mod tesseract;

mod process;

pub use adapter::{OcrAdapter, OcrAdapterBuilder};
pub use command::QuadCommand;
pub use engine::{EngineKind, EngineSelector, OcrBackend, OcrError, QuadDetector, TokenDetector};
pub use raw::{normalize_quads, normalize_tokens, Point, QuadDetection, TokenTable};
pub use region::Detection;
pub use tesseract::TesseractCli;
