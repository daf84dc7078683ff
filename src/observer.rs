//! Observer trait for submission lifecycle events.
//!
//! Inject an [`Arc<dyn SubmissionObserver>`] via
//! [`crate::session::FormSession::with_observer`] to be told when a file is
//! picked, when an upload starts, and how it settled. The CLI uses this to
//! drive its spinner; a GUI could forward the same events to its event loop.
//!
//! # Example
//!
//! ```rust
//! use plate_extract::SubmissionObserver;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountSuccesses(AtomicUsize);
//!
//! impl SubmissionObserver for CountSuccesses {
//!     fn on_success(&self, number: &str, elapsed_ms: u64) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{number} in {elapsed_ms}ms");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by [`crate::session::FormSession`] as the form changes state.
///
/// Implementations must be `Send + Sync`: a submit may run on a spawned
/// task while the front end keeps selecting files on another. All methods
/// default to no-ops.
pub trait SubmissionObserver: Send + Sync {
    /// A new file replaced the selection.
    fn on_image_selected(&self, file_name: &str, byte_len: usize) {
        let _ = (file_name, byte_len);
    }

    /// An upload was accepted and is about to be sent.
    fn on_submit_start(&self, file_name: &str, byte_len: usize) {
        let _ = (file_name, byte_len);
    }

    /// The current upload settled with a `number`.
    fn on_success(&self, number: &str, elapsed_ms: u64) {
        let _ = (number, elapsed_ms);
    }

    /// The current upload failed.
    ///
    /// `detail` is the diagnostic text, not the message the user sees.
    fn on_failure(&self, detail: &str, elapsed_ms: u64) {
        let _ = (detail, elapsed_ms);
    }

    /// An upload from an older generation settled or was cancelled and its
    /// result was thrown away.
    fn on_discarded(&self, generation: u64) {
        let _ = generation;
    }
}

/// Default observer: ignores everything.
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {}

pub type ObserverRef = Arc<dyn SubmissionObserver>;
