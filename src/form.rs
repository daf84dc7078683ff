//! The upload form as a plain state machine.
//!
//! ```text
//!   Idle ──select──▶ FileSelected ──begin_submit──▶ Submitting
//!    │                   ▲    ▲                        │
//!    │ begin_submit      │    └───── complete ─────────┘  (Success | Failure)
//!    ▼                   │
//!  Idle + "Please select an image first."     select (any state)
//! ```
//!
//! `UploadForm` does no I/O. A submit is split into [`UploadForm::begin_submit`],
//! which hands out a [`SubmitTicket`], and [`UploadForm::complete`], which
//! takes the ticket back with the transport's result. Every selection, every
//! accepted submit and every teardown bumps a generation counter; a ticket
//! from an older generation completes as [`Completion::Discarded`] and leaves
//! the form untouched.

use crate::error::RequestError;
use crate::output::{FormView, Outcome};
use crate::pipeline::input::SelectedImage;
use crate::pipeline::preview::ImagePreview;
use thiserror::Error;
use tracing::{debug, error};

pub const TITLE: &str = "Car Plate Number Extractor";
pub const NO_IMAGE_MESSAGE: &str = "Please select an image first.";
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract the number. Please try again.";
pub const SUBMIT_LABEL: &str = "Upload and Extract";
pub const SUBMITTING_LABEL: &str = "Extracting...";

/// Why [`UploadForm::begin_submit`] did not start a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRefused {
    #[error("{}", NO_IMAGE_MESSAGE)]
    NoImage,
    #[error("a request is already in flight")]
    InFlight,
}

/// Permission to run one request, tied to the generation that issued it.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    generation: u64,
    image: SelectedImage,
}

impl SubmitTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The image to upload. Owned by the ticket, so a later selection on the
    /// form cannot change what this request sends.
    pub fn image(&self) -> &SelectedImage {
        &self.image
    }
}

/// How a submit settled from the form's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The result was written into the form.
    Applied(Outcome),
    /// The ticket was stale; nothing changed.
    Discarded { generation: u64 },
    /// No request was made.
    Refused(SubmitRefused),
}

#[derive(Debug, Default)]
pub struct UploadForm {
    selected: Option<SelectedImage>,
    preview: Option<ImagePreview>,
    outcome: Outcome,
    loading: bool,
    generation: u64,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection. Clears any result or error on screen and
    /// abandons an in-flight request.
    pub fn select_image(&mut self, image: SelectedImage) {
        if self.loading {
            debug!(
                "Selection changed while generation {} was in flight; abandoning it",
                self.generation
            );
        }
        self.preview = Some(ImagePreview::from_image(&image));
        self.selected = Some(image);
        self.outcome = Outcome::None;
        self.loading = false;
        self.generation += 1;
    }

    /// Start a submit if the form allows one.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitRefused> {
        let Some(image) = self.selected.clone() else {
            self.outcome = Outcome::Failure(NO_IMAGE_MESSAGE.to_string());
            return Err(SubmitRefused::NoImage);
        };
        if self.loading {
            return Err(SubmitRefused::InFlight);
        }

        self.loading = true;
        if self.outcome.is_failure() {
            self.outcome = Outcome::None;
        }
        self.generation += 1;
        debug!("Submitting {} as generation {}", image.file_name(), self.generation);

        Ok(SubmitTicket {
            generation: self.generation,
            image,
        })
    }

    /// Settle the request that `ticket` was issued for.
    pub fn complete(
        &mut self,
        ticket: SubmitTicket,
        result: Result<String, RequestError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale result for generation {} (current {})",
                ticket.generation, self.generation
            );
            return Completion::Discarded {
                generation: ticket.generation,
            };
        }

        self.outcome = match result {
            Ok(number) => Outcome::Success(number),
            Err(e) => {
                error!("Error uploading image: {}", e);
                Outcome::Failure(EXTRACTION_FAILED_MESSAGE.to_string())
            }
        };
        self.loading = false;
        Completion::Applied(self.outcome.clone())
    }

    /// Invalidate any outstanding ticket, as when the form goes away.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.loading = false;
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.loading
    }

    pub fn view(&self) -> FormView {
        FormView {
            title: TITLE,
            preview: self.preview.clone(),
            submit_enabled: self.can_submit(),
            submit_label: if self.loading {
                SUBMITTING_LABEL
            } else {
                SUBMIT_LABEL
            },
            loading: self.loading,
            outcome: self.outcome.clone(),
        }
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
