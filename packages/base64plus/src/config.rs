//! TOML configuration for the `b64p` binary and other embedders.
//!
//! Every key is optional; an empty file yields the defaults below.
//!
//! ```toml
//! [encode]
//! engine = "auto"
//! include_confidence = true
//! format = "png"
//!
//! [tesseract]
//! enabled = true
//! program = "tesseract"
//! languages = ["eng"]
//!
//! [easyocr]
//! program = "easyocr-json"
//! args = []
//! ```

use std::path::{Path, PathBuf};

use base64plus_ocr::{OcrAdapter, QuadCommand, TesseractCli};
use serde::Deserialize;
use tracing::{debug, info};

use crate::encoder::EncodeOptions;
use crate::error::{Base64PlusError, Result};
use crate::format::EnvelopeFormat;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encode: EncodeSection,
    pub tesseract: TesseractSection,
    /// Engine A is only registered when this table is present.
    pub easyocr: Option<EasyOcrSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncodeSection {
    pub engine: String,
    pub include_confidence: bool,
    pub format: Option<String>,
}

impl Default for EncodeSection {
    fn default() -> Self {
        Self {
            engine: "auto".to_string(),
            include_confidence: true,
            format: None,
        }
    }
}

/// Per-run values that take precedence over the `[encode]` table, such as
/// command line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeOverrides {
    pub engine: Option<String>,
    pub format: Option<String>,
    pub include_confidence: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TesseractSection {
    pub enabled: bool,
    pub program: PathBuf,
    pub languages: Vec<String>,
}

impl Default for TesseractSection {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("tesseract"),
            languages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EasyOcrSection {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Base64PlusError::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Base64PlusError::Config(e.to_string()))
    }

    /// Parses the `[encode]` table into typed options.
    pub fn encode_options(&self) -> Result<EncodeOptions> {
        self.encode_options_with(&EncodeOverrides::default())
    }

    /// Like [`Config::encode_options`], but a set override replaces its
    /// config value before that value is parsed, so a bad entry in the file
    /// does not matter once it is overridden.
    pub fn encode_options_with(&self, overrides: &EncodeOverrides) -> Result<EncodeOptions> {
        let engine = overrides.engine.as_deref().unwrap_or(self.encode.engine.as_str());
        let format = overrides.format.as_deref().or(self.encode.format.as_deref());
        Ok(EncodeOptions {
            engine: engine.parse()?,
            include_confidence: overrides
                .include_confidence
                .unwrap_or(self.encode.include_confidence),
            format: format
                .map(|format| format.parse::<EnvelopeFormat>())
                .transpose()?,
        })
    }

    /// Registers the configured engines. Tesseract is probed once here and
    /// left out if it does not run.
    pub fn build_adapter(&self) -> OcrAdapter {
        let mut builder = OcrAdapter::builder();

        if let Some(easyocr) = &self.easyocr {
            let command = QuadCommand::new(&easyocr.program).with_args(easyocr.args.clone());
            debug!(program = %command.program().display(), "registering easyocr command");
            builder = builder.quad(command);
        }

        if self.tesseract.enabled {
            let tesseract = TesseractCli::with_program(&self.tesseract.program)
                .with_languages(self.tesseract.languages.clone());
            let program = tesseract.program().display().to_string();
            match tesseract.probe() {
                Ok(version) => {
                    info!(%program, %version, "registering tesseract");
                    builder = builder.token(tesseract);
                }
                Err(err) => debug!(%program, %err, "tesseract not registered"),
            }
        }

        builder.build()
    }
}
