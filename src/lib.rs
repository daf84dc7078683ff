//! # plate-extract
//!
//! Client for a license-plate extraction service: pick an image, upload it,
//! show the recognised number or an error.
//!
//! The interesting part is the request lifecycle. [`UploadForm`] is a
//! synchronous state machine (selection, loading flag, one tagged
//! [`Outcome`]); [`FormSession`] drives it asynchronously over an injectable
//! [`ExtractionTransport`], cancelling the in-flight upload whenever the
//! selection changes so a stale response can never overwrite a fresh one.
//!
//! ## Lifecycle
//!
//! ```text
//! select_image ──▶ begin_submit ──▶ transport.submit ──▶ complete
//!      ▲             (ticket, gen N)   (multipart POST)   (applied iff gen == N)
//!      └──── cancels the token of any request still in flight
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plate_extract::{extract, UploadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder()
//!         .endpoint("http://localhost:5000/upload")
//!         .build()?;
//!     let out = extract("car.jpg", &config).await?;
//!     println!("{}", out.number);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `plate-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod form;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{UploadConfig, UploadConfigBuilder, DEFAULT_ENDPOINT};
pub use error::{PlateError, RequestError};
pub use extract::{extract, extract_bytes, extract_sync, extract_with};
pub use form::{Completion, SubmitRefused, SubmitTicket, UploadForm};
pub use observer::{NoopObserver, ObserverRef, SubmissionObserver};
pub use output::{Extraction, FormView, Outcome};
pub use pipeline::input::{resolve_image, SelectedImage};
pub use pipeline::postprocess::{normalize_plate, PlateReading};
pub use pipeline::preview::ImagePreview;
pub use pipeline::transport::{ExtractionTransport, HttpTransport};
pub use session::FormSession;
