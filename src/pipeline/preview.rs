//! Preview of the selected image.
//!
//! A browser form shows the picked file through an object URL. The terminal
//! equivalent is a short summary (format, pixel size, byte size) plus a
//! `data:` URI that a front end can hand to anything able to render one.
//!
//! Decoding only reads the header. If it fails the preview is still built,
//! with unknown dimensions, because a chosen file always has a preview.

use crate::pipeline::input::SelectedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use tracing::debug;

/// What the form shows for the currently selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePreview {
    pub file_name: String,
    pub byte_len: usize,
    /// MIME type detected from the content, falling back to the extension guess.
    pub mime_type: String,
    /// `(width, height)` when the header could be decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl ImagePreview {
    pub fn from_image(image: &SelectedImage) -> Self {
        let detected = image::guess_format(image.bytes()).ok();
        let dimensions = image::ImageReader::new(Cursor::new(image.bytes()))
            .with_guessed_format()
            .ok()
            .and_then(|r| r.into_dimensions().ok());

        if dimensions.is_none() {
            debug!("No decodable header in {}", image.file_name());
        }

        Self {
            file_name: image.file_name().to_string(),
            byte_len: image.len(),
            mime_type: detected
                .map(|f| f.to_mime_type().to_string())
                .unwrap_or_else(|| image.mime_type().to_string()),
            dimensions,
        }
    }

    /// A `data:` URI embedding the whole file.
    pub fn data_uri(&self, image: &SelectedImage) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(image.bytes()))
    }
}

impl fmt::Display for ImagePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, ", self.file_name, self.mime_type)?;
        match self.dimensions {
            Some((w, h)) => write!(f, "{w}×{h} px, ")?,
            None => write!(f, "size unknown, ")?,
        }
        write!(f, "{} bytes)", self.byte_len)
    }
}
