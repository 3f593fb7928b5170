use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose};
use image::{ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

use crate::media_ingestion::EncodeFormat;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("File is empty")]
    Empty,
    #[error("Failed to guess image format: {0}")]
    UnknownFormat(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// An upload decoded to RGB, plus the format it will be re-encoded under.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub format: EncodeFormat,
    pub pixels: RgbImage,
}

impl UploadedImage {
    /// Decodes whatever container the bytes hold and flattens it to RGB.
    ///
    /// The encode format comes from `file_name` alone, so a PNG named
    /// `leaf.jpg` is accepted and re-encoded as JPEG.
    pub fn decode(file_name: &str, data: &[u8]) -> Result<Self, IngestError> {
        if data.is_empty() {
            return Err(IngestError::Empty);
        }

        let pixels = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?
            .to_rgb8();

        let format = EncodeFormat::from_file_name(file_name);
        tracing::debug!(
            "Decoded {} ({}x{}) for {} encoding",
            file_name,
            pixels.width(),
            pixels.height(),
            format
        );

        Ok(Self {
            file_name: file_name.to_string(),
            format,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_rgb(&self.pixels, self.format)
    }

    pub fn data_url(&self) -> Result<String> {
        Ok(data_url(self.format, &self.encode()?))
    }
}

pub fn encode_rgb(pixels: &RgbImage, format: EncodeFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    pixels
        .write_to(&mut buffer, format.image_format())
        .with_context(|| format!("Failed to encode image as {}", format))?;
    Ok(buffer.into_inner())
}

pub fn to_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn data_url(format: EncodeFormat, data: &[u8]) -> String {
    format!("data:{};base64,{}", format.mime_type(), to_base64(data))
}
