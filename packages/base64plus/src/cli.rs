//! Command line arguments backing the `b64p` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "b64p",
  about = "Bundle an image and its OCR text into a Base64Plus envelope, and read it back",
  version
)]
pub struct Args {
  /// TOML configuration file
  #[arg(long, short = 'c', global = true, env = "B64P_CONFIG")]
  pub config: Option<PathBuf>,

  /// Log debug output to stderr
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Run OCR on an image and write the envelope JSON
  Encode {
    /// Image to encode
    image: PathBuf,

    /// Write the envelope here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// OCR engine: easyocr, tesseract or auto
    #[arg(long, short = 'e')]
    engine: Option<String>,

    /// Image format inside the envelope: png, jpeg or jpg
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Keep confidence scores in the envelope
    #[arg(long, overrides_with = "no_confidence")]
    include_confidence: bool,

    /// Leave confidence scores out of the envelope
    #[arg(long, overrides_with = "include_confidence")]
    no_confidence: bool,
  },
  /// Extract the image (and optionally the text data) from an envelope
  Decode {
    /// Envelope file
    envelope: PathBuf,

    /// Where to write the image; the extension picks the format
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Also write the text_data array to this file
    #[arg(long)]
    text_data: Option<PathBuf>,
  },
  /// Summarize an envelope
  Inspect {
    /// Envelope file
    envelope: PathBuf,

    /// Number of detections to list
    #[arg(long, short = 'n', default_value = "5")]
    limit: usize,
  },
}
