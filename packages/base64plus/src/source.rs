use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::Result;

/// A decoded input image together with the format it was stored in.
///
/// The format is sniffed from the bytes, not taken from a file extension, so
/// a `.jpg` file is recognised as JPEG and a mislabelled file is not trusted.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl SourceImage {
    pub fn new(image: DynamicImage, format: Option<ImageFormat>) -> Self {
        Self { image, format }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format();
        let image = reader.decode()?;
        Ok(Self { image, format })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes).ok();
        let image = image::load_from_memory(bytes)?;
        Ok(Self { image, format })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

impl From<DynamicImage> for SourceImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image, None)
    }
}
