//! The Base64Plus envelope: an image as standard Base64 plus its text
//! detections, serialized as one JSON object.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use base64plus_ocr::Detection;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Base64PlusError, Result};
use crate::format::EnvelopeFormat;
use crate::source::SourceImage;

/// An encoded envelope. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    image: String,
    text_data: Vec<Detection>,
    format: EnvelopeFormat,
}

impl Envelope {
    /// Re-encodes `image` as `format` and attaches the detections. With
    /// `include_confidence` unset every confidence score is removed.
    ///
    /// With it set the scores are kept as given, so every `text_data` entry
    /// shares one shape only if the detections agree: a mix of scored and
    /// unscored detections is rejected with
    /// [`Base64PlusError::MixedConfidence`].
    pub fn new(
        image: &DynamicImage,
        detections: Vec<Detection>,
        format: EnvelopeFormat,
        include_confidence: bool,
    ) -> Result<Self> {
        if include_confidence {
            check_uniform_confidence(&detections)?;
        }
        let bytes = encode_image(image, format)?;
        let text_data = if include_confidence {
            detections
        } else {
            detections
                .into_iter()
                .map(Detection::without_confidence)
                .collect()
        };
        debug!(
            %format,
            image_bytes = bytes.len(),
            regions = text_data.len(),
            include_confidence,
            "built envelope"
        );
        Ok(Self {
            image: STANDARD.encode(&bytes),
            text_data,
            format,
        })
    }

    /// Like [`Envelope::new`], defaulting the format from the source.
    pub fn from_source(
        source: &SourceImage,
        detections: Vec<Detection>,
        format: Option<EnvelopeFormat>,
        include_confidence: bool,
    ) -> Result<Self> {
        let format = EnvelopeFormat::resolve(format, source.format());
        Self::new(source.image(), detections, format, include_confidence)
    }

    pub fn image_base64(&self) -> &str {
        &self.image
    }

    pub fn text_data(&self) -> &[Detection] {
        &self.text_data
    }

    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encodes `image` in `format`. JPEG carries no alpha channel, so the image
/// is flattened to RGB first.
pub fn encode_image(image: &DynamicImage, format: EnvelopeFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        EnvelopeFormat::Png => image.write_to(&mut buf, ImageFormat::Png)?,
        EnvelopeFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buf, ImageFormat::Jpeg)?
        }
    }
    Ok(buf.into_inner())
}

/// Builds an envelope and serializes it in one step.
pub fn encode(
    image: &DynamicImage,
    detections: Vec<Detection>,
    format: EnvelopeFormat,
    include_confidence: bool,
) -> Result<String> {
    Envelope::new(image, detections, format, include_confidence)?.to_json()
}

/// A parsed envelope.
#[derive(Debug, Clone)]
pub struct DecodedEnvelope {
    image: DynamicImage,
    format: ImageFormat,
    declared_format: Option<String>,
    text_data: Vec<Value>,
}

impl DecodedEnvelope {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Format inferred from the image bytes.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn envelope_format(&self) -> Option<EnvelopeFormat> {
        EnvelopeFormat::from_image_format(self.format)
    }

    /// The `format` field as written by the producer, if any.
    pub fn declared_format(&self) -> Option<&str> {
        self.declared_format.as_deref()
    }

    /// `text_data` exactly as it appeared in the envelope.
    pub fn text_data(&self) -> &[Value] {
        &self.text_data
    }

    /// `text_data` read as detection records.
    pub fn detections(&self) -> Result<Vec<Detection>> {
        self.text_data
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Detection::deserialize(value).map_err(|e| {
                    Base64PlusError::malformed(format!("text_data[{i}] is not a detection: {e}"))
                })
            })
            .collect()
    }

    pub fn into_parts(self) -> (DynamicImage, Vec<Value>) {
        (self.image, self.text_data)
    }
}

fn check_uniform_confidence(detections: &[Detection]) -> Result<()> {
    let Some(first) = detections.first() else {
        return Ok(());
    };
    let scored = first.confidence.is_some();
    match detections
        .iter()
        .position(|d| d.confidence.is_some() != scored)
    {
        Some(i) => Err(Base64PlusError::MixedConfidence(format!(
            "detection 0 {} a score but detection {i} {}",
            if scored { "has" } else { "lacks" },
            if scored { "does not" } else { "does" },
        ))),
        None => Ok(()),
    }
}

/// Parses an envelope string. The `format` field is optional and is not
/// trusted: the image format is sniffed from the decoded bytes.
pub fn decode(input: &str) -> Result<DecodedEnvelope> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| Base64PlusError::malformed(format!("not valid JSON: {e}")))?;
    let Value::Object(mut fields) = value else {
        return Err(Base64PlusError::malformed("expected a JSON object"));
    };

    let (Some(image), Some(text_data)) = (fields.remove("image"), fields.remove("text_data")) else {
        return Err(Base64PlusError::malformed(
            "missing required field `image` or `text_data`",
        ));
    };
    let Value::String(payload) = image else {
        return Err(Base64PlusError::malformed("`image` must be a string"));
    };
    let Value::Array(text_data) = text_data else {
        return Err(Base64PlusError::malformed("`text_data` must be an array"));
    };
    let declared_format = match fields.remove("format") {
        Some(Value::String(format)) => Some(format),
        _ => None,
    };

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| Base64PlusError::malformed(format!("`image` is not valid base64: {e}")))?;
    let format = image::guess_format(&bytes)
        .map_err(|_| Base64PlusError::malformed("`image` does not hold a recognizable image"))?;
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| Base64PlusError::malformed(format!("`image` could not be decoded: {e}")))?;

    debug!(?format, regions = text_data.len(), "decoded envelope");

    Ok(DecodedEnvelope {
        image,
        format,
        declared_format,
        text_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use serde_json::json;

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(12, 8, |x, y| {
            Rgb([(x * 20) as u8, (y * 30) as u8, 200])
        }))
    }

    fn sample_detections() -> Vec<Detection> {
        vec![
            Detection::new("Base64Plus", 10, 10, 120, 24).with_confidence(0.96),
            Detection::new("Test", 150, 10, 60, 24).with_confidence(0.5),
        ]
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let image = sample_image();
        let json = encode(&image, sample_detections(), EnvelopeFormat::Png, true).unwrap();

        let decoded = decode(&json).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Png);
        assert_eq!(
            encode_image(decoded.image(), EnvelopeFormat::Png).unwrap(),
            encode_image(&image, EnvelopeFormat::Png).unwrap()
        );
        assert_eq!(decoded.detections().unwrap(), sample_detections());
    }

    #[test]
    fn test_key_order_and_shape() {
        let json = encode(&sample_image(), sample_detections(), EnvelopeFormat::Png, true).unwrap();
        let image_at = json.find("\"image\"").unwrap();
        let text_at = json.find("\"text_data\"").unwrap();
        let format_at = json.find("\"format\"").unwrap();
        assert!(image_at < text_at && text_at < format_at);

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "png");
        assert_eq!(value["text_data"][0]["width"], 120);
        assert!(!value["image"].as_str().unwrap().contains('\n'));
    }

    #[test]
    fn test_confidence_stripped() {
        let json = encode(&sample_image(), sample_detections(), EnvelopeFormat::Png, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let entries = value["text_data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        for entry in entries {
            assert!(entry.get("confidence").is_none());
        }
    }

    #[test]
    fn test_mixed_confidence_is_rejected_when_kept() {
        let mixed = vec![
            Detection::new("scored", 0, 0, 10, 10).with_confidence(0.7),
            Detection::new("bare", 10, 0, 10, 10),
        ];
        let err = encode(&sample_image(), mixed.clone(), EnvelopeFormat::Png, true).unwrap_err();
        assert!(matches!(err, Base64PlusError::MixedConfidence(msg) if msg.contains("detection 1")));

        // Stripping makes the entries uniform again.
        let json = encode(&sample_image(), mixed, EnvelopeFormat::Png, false).unwrap();
        let decoded = decode(&json).unwrap();
        assert!(decoded.detections().unwrap().iter().all(|d| d.confidence.is_none()));
    }

    #[test]
    fn test_unscored_detections_are_uniform() {
        let bare = vec![Detection::new("a", 0, 0, 1, 1), Detection::new("b", 1, 1, 1, 1)];
        let envelope = Envelope::new(&sample_image(), bare, EnvelopeFormat::Png, true).unwrap();
        assert!(envelope.text_data().iter().all(|d| d.confidence.is_none()));
    }

    #[test]
    fn test_into_parts() {
        let json = encode(&sample_image(), sample_detections(), EnvelopeFormat::Png, true).unwrap();
        let (image, text_data) = decode(&json).unwrap().into_parts();
        assert_eq!(image.to_rgb8(), sample_image().to_rgb8());
        assert_eq!(text_data.len(), 2);
        assert_eq!(text_data[0]["text"], "Base64Plus");
        assert_eq!(text_data[1]["confidence"], 0.5);
    }

    #[test]
    fn test_jpeg_envelope() {
        let json = encode(&sample_image(), Vec::new(), "JPG".parse().unwrap(), true).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "jpeg");

        let decoded = decode(&json).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Jpeg);
        assert_eq!(decoded.envelope_format(), Some(EnvelopeFormat::Jpeg));
        assert_eq!(decoded.image().width(), 12);
    }

    #[test]
    fn test_jpeg_flattens_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128])));
        let bytes = encode_image(&rgba, EnvelopeFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_from_source_defaults_to_source_format() {
        let source = SourceImage::new(sample_image(), Some(ImageFormat::Jpeg));
        let envelope = Envelope::from_source(&source, Vec::new(), None, true).unwrap();
        assert_eq!(envelope.format(), EnvelopeFormat::Jpeg);

        let source = SourceImage::new(sample_image(), Some(ImageFormat::Bmp));
        let envelope = Envelope::from_source(&source, Vec::new(), None, true).unwrap();
        assert_eq!(envelope.format(), EnvelopeFormat::Png);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode("not json"),
            Err(Base64PlusError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            decode("[1, 2, 3]"),
            Err(Base64PlusError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_requires_both_fields() {
        assert!(matches!(
            decode(r#"{"image":"abc"}"#),
            Err(Base64PlusError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            decode(r#"{"text_data":[]}"#),
            Err(Base64PlusError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let not_base64 = json!({"image": "***", "text_data": []}).to_string();
        assert!(matches!(
            decode(&not_base64),
            Err(Base64PlusError::MalformedEnvelope(msg)) if msg.contains("base64")
        ));

        let not_image = json!({"image": STANDARD.encode(b"hello world"), "text_data": []}).to_string();
        assert!(matches!(
            decode(&not_image),
            Err(Base64PlusError::MalformedEnvelope(_))
        ));

        let wrong_type = json!({"image": "", "text_data": {}}).to_string();
        assert!(matches!(
            decode(&wrong_type),
            Err(Base64PlusError::MalformedEnvelope(msg)) if msg.contains("array")
        ));
    }

    #[test]
    fn test_decode_ignores_declared_format() {
        let png = encode_image(&sample_image(), EnvelopeFormat::Png).unwrap();
        let lying = json!({"image": STANDARD.encode(&png), "text_data": [], "format": "jpeg"});
        let decoded = decode(&lying.to_string()).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Png);
        assert_eq!(decoded.declared_format(), Some("jpeg"));

        let absent = json!({"image": STANDARD.encode(&png), "text_data": []});
        let decoded = decode(&absent.to_string()).unwrap();
        assert_eq!(decoded.declared_format(), None);
    }

    #[test]
    fn test_text_data_returned_verbatim() {
        let png = encode_image(&sample_image(), EnvelopeFormat::Png).unwrap();
        let raw = json!([{"text": "hi", "x": 1, "y": 2, "width": 3, "height": 4, "extra": true}, 42]);
        let input = json!({"image": STANDARD.encode(&png), "text_data": raw.clone()});

        let decoded = decode(&input.to_string()).unwrap();
        assert_eq!(decoded.text_data(), raw.as_array().unwrap().as_slice());
        assert!(matches!(
            decoded.detections(),
            Err(Base64PlusError::MalformedEnvelope(msg)) if msg.contains("text_data[1]")
        ));
    }
}
