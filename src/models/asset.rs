//! Asset Models
//!
//! The raster image selected for an editing session.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Asset error
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("unreadable image data: {0}")]
    Decode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pixel dimensions decoded once at acquisition, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// A selected image file, owned exclusively by its editing session.
///
/// Created on file selection, discarded on cancel or handed off to the
/// upload pipeline on confirmation. The raw bytes are never modified; crop,
/// zoom, and rotation stay presentation metadata layered on top.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
    natural: NaturalSize,
}

impl ImageAsset {
    /// Build an asset from raw bytes and a known MIME type, decoding the
    /// natural dimensions once.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let reader = image::ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let (width, height) = reader.into_dimensions()?;

        Ok(Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
            natural: NaturalSize::new(width, height),
        })
    }

    /// Build an asset from raw bytes, sniffing the MIME type.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AssetError> {
        let file_name = file_name.into();
        let mime_type = detect_mime_type(&bytes, &file_name);
        Self::new(file_name, mime_type, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn natural(&self) -> NaturalSize {
        self.natural
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File extension from the name, falling back to the MIME subtype.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| {
                self.mime_type
                    .split('/')
                    .nth(1)
                    .unwrap_or("bin")
                    .to_string()
            })
    }

    /// Session-scoped local preview handle, the data-URL analog of an
    /// object URL. Dropped with the asset.
    pub fn preview_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }

    /// Transfer ownership of the raw bytes out of the session.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Detect a MIME type from content, falling back to the file extension.
pub fn detect_mime_type(data: &[u8], file_name: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Encode a blank PNG of the given size, for tests.
#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
