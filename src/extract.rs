//! One-shot entry points: pick a file, submit it, return the result.
//!
//! These drive a private [`FormSession`] through exactly one
//! select → submit cycle. Use the session directly when the selection can
//! change while a request is in flight.

use crate::config::UploadConfig;
use crate::error::{PlateError, RequestError};
use crate::form::{Completion, SubmitRefused};
use crate::output::{Extraction, Outcome};
use crate::pipeline::input::{resolve_image, SelectedImage};
use crate::pipeline::transport::{ExtractionTransport, HttpTransport};
use crate::session::FormSession;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::info;

/// Upload the image at `path` and return what the service extracted.
///
/// # Errors
/// - the file cannot be read
/// - the upload failed, as [`PlateError::ExtractionFailed`] whose display
///   text is the generic user message and whose `detail` is the cause
///
/// # Example
/// ```rust,no_run
/// use plate_extract::{extract, UploadConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let out = extract("car.jpg", &UploadConfig::default()).await?;
/// println!("{}", out.number);
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    path: impl AsRef<Path>,
    config: &UploadConfig,
) -> Result<Extraction, PlateError> {
    let image = resolve_image(path).await?;
    let transport = Arc::new(HttpTransport::new(config)?);
    extract_with(image, transport).await
}

/// Same as [`extract`] for bytes already in memory.
pub async fn extract_bytes(
    file_name: impl Into<String>,
    bytes: impl Into<Vec<u8>>,
    config: &UploadConfig,
) -> Result<Extraction, PlateError> {
    let image = SelectedImage::from_bytes(file_name, bytes);
    let transport = Arc::new(HttpTransport::new(config)?);
    extract_with(image, transport).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &UploadConfig,
) -> Result<Extraction, PlateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PlateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(path, config))
}

/// Run one select → submit cycle over any transport.
pub async fn extract_with(
    image: SelectedImage,
    transport: Arc<dyn ExtractionTransport>,
) -> Result<Extraction, PlateError> {
    let start = Instant::now();
    let file_name = image.file_name().to_string();
    let recording = Arc::new(Recording {
        inner: transport,
        last_error: Mutex::new(None),
    });
    let endpoint = recording.endpoint().to_string();

    let session = FormSession::new(recording.clone());
    session.select_image(image);

    match session.submit().await {
        Completion::Applied(Outcome::Success(number)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            info!("Extracted '{}' from {} in {}ms", number, file_name, duration_ms);
            Ok(Extraction::new(number, file_name, endpoint, duration_ms))
        }
        Completion::Applied(_) => Err(PlateError::ExtractionFailed {
            detail: recording.take_error(),
        }),
        Completion::Refused(SubmitRefused::NoImage) => Err(PlateError::NoImageSelected),
        other => Err(PlateError::Internal(format!(
            "single submit settled unexpectedly: {other:?}"
        ))),
    }
}

/// Passes requests through and keeps the last failure, since the form
/// only ever stores the generic message.
struct Recording {
    inner: Arc<dyn ExtractionTransport>,
    last_error: Mutex<Option<RequestError>>,
}

impl Recording {
    fn take_error(&self) -> RequestError {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| RequestError::Other("unknown failure".to_string()))
    }
}

#[async_trait]
impl ExtractionTransport for Recording {
    async fn submit(&self, image: &SelectedImage) -> Result<String, RequestError> {
        let result = self.inner.submit(image).await;
        if let Err(ref e) = result {
            *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e.clone());
        }
        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
