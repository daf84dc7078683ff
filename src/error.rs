//! Error types for the plate-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PlateError`]: **Fatal** for the caller: the image could not be read,
//!   the configuration is invalid, or a one-shot extraction failed. Returned
//!   as `Err(PlateError)` from the top-level `extract*` functions.
//!
//! * [`RequestError`]: **Recoverable**: a single upload failed (service
//!   unreachable, non-2xx status, malformed body). The form never shows it to
//!   the user; it is logged and collapsed into one generic message, and the
//!   user can simply submit again.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the plate-extract library.
#[derive(Debug, Error)]
pub enum PlateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the image.
    #[error("Failed to read image '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Submit was requested before any image was selected.
    #[error("{}", crate::form::NO_IMAGE_MESSAGE)]
    NoImageSelected,

    // ── Request errors ────────────────────────────────────────────────────
    /// The upload failed. The display text is the generic user-facing
    /// message; `detail` carries the underlying cause for diagnostics.
    #[error("{}", crate::form::EXTRACTION_FAILED_MESSAGE)]
    ExtractionFailed { detail: RequestError },

    /// reqwest refused to build an HTTP client (TLS backend init etc.).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlateError {
    /// The diagnostic detail behind an [`PlateError::ExtractionFailed`].
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            PlateError::ExtractionFailed { detail } => Some(detail),
            _ => None,
        }
    }
}

/// Why one upload to the extraction service failed.
///
/// Carried to the log, never to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RequestError {
    /// TCP/TLS connection could not be established.
    #[error("could not connect to '{endpoint}': {reason}")]
    Connect { endpoint: String, reason: String },

    /// The request did not settle within the configured timeout.
    #[error("request to '{endpoint}' timed out")]
    Timeout { endpoint: String },

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not JSON.
    #[error("malformed response body: {reason}")]
    Decode { reason: String },

    /// Anything else reqwest reported.
    #[error("request failed: {0}")]
    Other(String),
}

impl RequestError {
    /// Classify a reqwest error raised while sending or reading a request.
    pub fn from_reqwest(endpoint: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            RequestError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if e.is_connect() {
            RequestError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        } else if e.is_decode() {
            RequestError::Decode {
                reason: e.to_string(),
            }
        } else {
            RequestError::Other(e.to_string())
        }
    }
}
