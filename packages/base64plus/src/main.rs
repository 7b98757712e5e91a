mod cli;

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64plus::{decode, Config, DecodedEnvelope, EncodeOptions, EncodeOverrides, Encoder};
use clap::Parser;
use cli::{Args, Commands};
use image::{DynamicImage, ImageFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
  let args = Args::parse();
  init_tracing(args.verbose);

  if let Err(e) = run(args) {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose {
    "b64p=debug,base64plus=debug,base64plus_ocr=debug"
  } else {
    "warn"
  };
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn run(args: Args) -> Result<()> {
  let config = match &args.config {
    Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
    None => Config::default(),
  };

  match args.command {
    Commands::Version => {
      println!("b64p {}", env!("CARGO_PKG_VERSION"));
      Ok(())
    }
    Commands::Encode {
      image,
      output,
      engine,
      format,
      include_confidence,
      no_confidence,
    } => {
      let overrides = EncodeOverrides {
        engine,
        format,
        include_confidence: match (include_confidence, no_confidence) {
          (true, _) => Some(true),
          (_, true) => Some(false),
          _ => None,
        },
      };
      let options = config.encode_options_with(&overrides)?;
      encode_file(&config, &image, output.as_deref(), &options)
    }
    Commands::Decode {
      envelope,
      output,
      text_data,
    } => {
      let decoded = read_envelope(&envelope)?;
      write_image(&decoded, &output)?;
      if let Some(path) = text_data {
        let json = serde_json::to_string_pretty(decoded.text_data())?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
      }
      Ok(())
    }
    Commands::Inspect { envelope, limit } => {
      let decoded = read_envelope(&envelope)?;
      inspect(&decoded, limit)
    }
  }
}

fn encode_file(
  config: &Config,
  image: &Path,
  output: Option<&Path>,
  options: &EncodeOptions,
) -> Result<()> {
  let encoder = Encoder::new(config.build_adapter());
  let json = encoder
    .encode_path(image, options)
    .with_context(|| format!("encoding {}", image.display()))?;

  match output {
    Some(path) => fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
    None => {
      let mut stdout = std::io::stdout().lock();
      writeln!(stdout, "{}", json)?;
    }
  }
  Ok(())
}

fn read_envelope(path: &Path) -> Result<DecodedEnvelope> {
  let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  let decoded = decode(&contents).with_context(|| format!("decoding {}", path.display()))?;
  Ok(decoded)
}

fn write_image(decoded: &DecodedEnvelope, path: &Path) -> Result<()> {
  let format = ImageFormat::from_path(path).unwrap_or(decoded.format());
  let image = if format == ImageFormat::Jpeg {
    DynamicImage::ImageRgb8(decoded.image().to_rgb8())
  } else {
    decoded.image().clone()
  };
  image
    .save_with_format(path, format)
    .with_context(|| format!("writing {}", path.display()))?;
  Ok(())
}

fn inspect(decoded: &DecodedEnvelope, limit: usize) -> Result<()> {
  let detections = decoded.detections()?;
  let format = decoded
    .envelope_format()
    .map(|f| f.to_string())
    .unwrap_or_else(|| format!("{:?}", decoded.format()).to_lowercase());

  println!("Image format: {}", format);
  println!("Image size: {}x{}", decoded.image().width(), decoded.image().height());
  println!("Number of text elements detected: {}", detections.len());

  if detections.is_empty() {
    return Ok(());
  }

  println!("\nDetected text elements:");
  for (i, item) in detections.iter().take(limit).enumerate() {
    println!("{}. Text: {}", i + 1, item.text);
    println!(
      "   Position: x={}, y={}, width={}, height={}",
      item.x, item.y, item.width, item.height
    );
    if let Some(confidence) = item.confidence {
      println!("   Confidence: {:.2}", confidence);
    }
  }
  if detections.len() > limit {
    println!("... and {} more elements", detections.len() - limit);
  }
  Ok(())
}
