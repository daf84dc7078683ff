//! Pipeline stages between a file on disk and a value on screen.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preview            (shown as soon as a file is chosen)
//!   │
//!   └────▶ transport ──▶ postprocess
//!         (multipart POST)  (classify `number`)
//! ```
//!
//! 1. [`input`]       resolve a path to a [`input::SelectedImage`]
//! 2. [`preview`]     header-only decode for the preview line and a `data:` URI
//! 3. [`transport`]   the [`transport::ExtractionTransport`] seam and its reqwest
//!    implementation; the only stage with network I/O
//! 4. [`postprocess`] tell a plate reading from the service's "nothing found"
//!    sentences

pub mod input;
pub mod postprocess;
pub mod preview;
pub mod transport;
