/// Encoded still images as they move through the pipeline
///
/// A `CapturedImage` is an opaque encoded raster (JPEG from the camera, any
/// decodable format from uploads, PNG from AI edits) plus the metadata needed
/// to hand it to the compositor or the AI service without decoding it again.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{Result, SnapError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Shared so sessions, tickets and gallery records can clone cheaply
    data: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl CapturedImage {
    /// Wrap already-encoded bytes, sniffing format and dimensions.
    /// Fails with `DecodeFailed` for anything that isn't a known raster.
    pub fn from_encoded(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| SnapError::DecodeFailed(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| SnapError::DecodeFailed("unrecognized image format".into()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| SnapError::DecodeFailed(e.to_string()))?;

        Ok(Self {
            data: bytes.into(),
            format,
            width,
            height,
        })
    }

    /// Encode RGB pixels as JPEG at the given quality
    pub fn from_rgb_jpeg(pixels: &RgbImage, quality: u8) -> Result<Self> {
        let data = encode_jpeg(pixels, quality)?;
        Ok(Self {
            data: data.into(),
            format: ImageFormat::Jpeg,
            width: pixels.width(),
            height: pixels.height(),
        })
    }

    /// Parse a `data:image/...;base64,` reference (or bare base64)
    pub fn from_data_url(url: &str) -> Result<Self> {
        let payload = strip_data_url_prefix(url.trim());
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| SnapError::DecodeFailed(format!("invalid base64: {e}")))?;
        Self::from_encoded(bytes)
    }

    /// Full decode to pixels
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.data, self.format)
            .map_err(|e| SnapError::DecodeFailed(e.to_string()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Base64 body with no data-URI prefix, as the AI service expects
    pub fn base64_payload(&self) -> String {
        BASE64.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.base64_payload())
    }
}

/// Drop a leading `data:<mime>;base64,` if present
pub fn strip_data_url_prefix(url: &str) -> &str {
    if url.starts_with("data:") {
        if let Some(idx) = url.find(";base64,") {
            return &url[idx + ";base64,".len()..];
        }
    }
    url
}

/// Lossy raster encode shared by capture and the compositor
pub fn encode_jpeg(pixels: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    pixels
        .write_with_encoder(encoder)
        .map_err(|e| SnapError::EncodeFailed(e.to_string()))?;
    Ok(out)
}

/// Lossless encode, used for AI-edit payloads in tests and exports
pub fn encode_png(pixels: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut out);
    pixels
        .write_with_encoder(encoder)
        .map_err(|e| SnapError::EncodeFailed(e.to_string()))?;
    Ok(out)
}
