//! Image encodings an envelope may carry.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use serde::Serialize;

use crate::error::Base64PlusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    Png,
    Jpeg,
}

impl EnvelopeFormat {
    /// Used when no format is requested and the source is neither PNG nor JPEG.
    pub const DEFAULT: EnvelopeFormat = EnvelopeFormat::Png;

    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeFormat::Png => "png",
            EnvelopeFormat::Jpeg => "jpeg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            EnvelopeFormat::Png => ImageFormat::Png,
            EnvelopeFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(EnvelopeFormat::Png),
            ImageFormat::Jpeg => Some(EnvelopeFormat::Jpeg),
            _ => None,
        }
    }

    /// Picks the output encoding: the requested one, else the source's if
    /// supported, else [`EnvelopeFormat::DEFAULT`].
    pub fn resolve(requested: Option<Self>, source: Option<ImageFormat>) -> Self {
        requested
            .or_else(|| source.and_then(Self::from_image_format))
            .unwrap_or(Self::DEFAULT)
    }
}

impl fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeFormat {
    type Err = Base64PlusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(EnvelopeFormat::Png),
            "jpeg" | "jpg" => Ok(EnvelopeFormat::Jpeg),
            _ => Err(Base64PlusError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpg_aliases_jpeg() {
        for token in ["jpg", "JPG", "Jpeg", "JPEG", " jpeg "] {
            assert_eq!(token.parse::<EnvelopeFormat>().unwrap(), EnvelopeFormat::Jpeg);
        }
        assert_eq!("PNG".parse::<EnvelopeFormat>().unwrap(), EnvelopeFormat::Png);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let err = "gif".parse::<EnvelopeFormat>().unwrap_err();
        assert!(matches!(err, Base64PlusError::UnsupportedFormat(ref s) if s == "gif"));
    }

    #[test]
    fn test_resolve_order() {
        assert_eq!(
            EnvelopeFormat::resolve(Some(EnvelopeFormat::Jpeg), Some(ImageFormat::Png)),
            EnvelopeFormat::Jpeg
        );
        assert_eq!(
            EnvelopeFormat::resolve(None, Some(ImageFormat::Jpeg)),
            EnvelopeFormat::Jpeg
        );
        assert_eq!(EnvelopeFormat::resolve(None, Some(ImageFormat::Gif)), EnvelopeFormat::Png);
        assert_eq!(EnvelopeFormat::resolve(None, None), EnvelopeFormat::Png);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EnvelopeFormat::Jpeg).unwrap(), "\"jpeg\"");
    }
}
