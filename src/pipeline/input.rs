//! Input resolution: turn a user-supplied path into a [`SelectedImage`].
//!
//! The form accepts whatever file the user picks. Nothing here checks that
//! the bytes are really an image; the `image/*` accept hint is exposed via
//! [`SelectedImage::matches_accept_hint`] for front ends that want to warn,
//! but the service is the only judge of what it can read.

use crate::error::PlateError;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An image file chosen by the user.
///
/// The byte buffer is shared, so cloning a `SelectedImage` into an in-flight
/// request does not copy the file.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedImage {
    file_name: String,
    mime_type: String,
    bytes: Bytes,
}

impl SelectedImage {
    /// Build a selection from bytes already in memory.
    ///
    /// The MIME type is guessed from the extension of `file_name`.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime(&file_name).to_string();
        let bytes: Vec<u8> = bytes.into();
        Self {
            file_name,
            mime_type,
            bytes: Bytes::from(bytes),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A handle to the same buffer, for request bodies.
    pub fn shared_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the file satisfies the picker's `accept="image/*"` hint.
    pub fn matches_accept_hint(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Read the file at `path` into a [`SelectedImage`].
pub async fn resolve_image(path: impl AsRef<Path>) -> Result<SelectedImage, PlateError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let image = SelectedImage::from_bytes(file_name, bytes);
    debug!(
        "Resolved image {} ({} bytes, {})",
        path.display(),
        image.len(),
        image.mime_type()
    );
    Ok(image)
}

fn read_error(path: &Path, e: std::io::Error) -> PlateError {
    let path = PathBuf::from(path);
    match e.kind() {
        std::io::ErrorKind::NotFound => PlateError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => PlateError::PermissionDenied { path },
        _ => PlateError::ReadFailed { path, source: e },
    }
}

/// Guess a MIME type from a file name's extension.
pub fn guess_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn guess_mime_by_extension() {
        assert_eq!(guess_mime("car.JPG"), "image/jpeg");
        assert_eq!(guess_mime("car.png"), "image/png");
        assert_eq!(guess_mime("scan.webp"), "image/webp");
        assert_eq!(guess_mime("notes.txt"), "application/octet-stream");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
    }

    #[test]
    fn accept_hint_is_advisory() {
        let img = SelectedImage::from_bytes("plate.jpeg", vec![1, 2, 3]);
        assert!(img.matches_accept_hint());
        let txt = SelectedImage::from_bytes("plate.txt", vec![1, 2, 3]);
        assert!(!txt.matches_accept_hint());
        // still a valid selection
        assert_eq!(txt.len(), 3);
    }

    #[test]
    fn clone_shares_buffer() {
        let img = SelectedImage::from_bytes("a.png", vec![0u8; 1024]);
        let copy = img.clone();
        assert_eq!(img.bytes().as_ptr(), copy.bytes().as_ptr());
        assert_eq!(img.shared_bytes().as_ptr(), img.bytes().as_ptr());
    }

    #[tokio::test]
    async fn resolve_reads_file_without_validation() {
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        tmp.write_all(b"definitely not a png").unwrap();

        let img = resolve_image(tmp.path()).await.expect("any bytes are accepted");
        assert_eq!(img.bytes(), b"definitely not a png");
        assert_eq!(img.mime_type(), "image/png");
        assert!(img.file_name().ends_with(".png"));
    }

    #[test]
    fn resolve_missing_file() {
        let err = tokio_test::block_on(resolve_image("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, PlateError::FileNotFound { .. }));
    }
}
