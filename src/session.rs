//! Async driver for [`UploadForm`].
//!
//! A [`FormSession`] owns the form, the transport, and the cancellation token
//! of the request currently in flight. It is cheap to clone; clones share the
//! same form, so one task can await a submit while another keeps feeding
//! file selections in.
//!
//! The form is locked only for synchronous transitions, never across the
//! network call. Two guards keep a stale response from reaching the form:
//!
//! 1. selecting a file (or tearing down) cancels the in-flight token, so the
//!    transport future is dropped at its next await point;
//! 2. if the response already arrived, the generation check in
//!    [`UploadForm::complete`] discards it.

use crate::error::PlateError;
use crate::form::{Completion, UploadForm};
use crate::observer::{NoopObserver, ObserverRef};
use crate::output::{FormView, Outcome};
use crate::pipeline::input::{resolve_image, SelectedImage};
use crate::pipeline::transport::ExtractionTransport;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct Inner {
    form: UploadForm,
    cancel: Option<CancellationToken>,
}

#[derive(Clone)]
pub struct FormSession {
    inner: Arc<Mutex<Inner>>,
    transport: Arc<dyn ExtractionTransport>,
    observer: ObserverRef,
}

impl FormSession {
    pub fn new(transport: Arc<dyn ExtractionTransport>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                form: UploadForm::new(),
                cancel: None,
            })),
            transport,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: ObserverRef) -> Self {
        self.observer = observer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the selection, cancelling any request still in flight.
    pub fn select_image(&self, image: SelectedImage) {
        let (name, len) = (image.file_name().to_string(), image.len());
        {
            let mut inner = self.lock();
            if let Some(token) = inner.cancel.take() {
                token.cancel();
            }
            inner.form.select_image(image);
        }
        self.observer.on_image_selected(&name, len);
    }

    /// Read `path` and select it.
    pub async fn select_path(&self, path: impl AsRef<Path>) -> Result<(), PlateError> {
        let image = resolve_image(path).await?;
        self.select_image(image);
        Ok(())
    }

    /// Submit the current selection and wait for it to settle.
    pub async fn submit(&self) -> Completion {
        let (ticket, token) = {
            let mut inner = self.lock();
            let ticket = match inner.form.begin_submit() {
                Ok(t) => t,
                Err(refused) => {
                    debug!("Submit refused: {}", refused);
                    return Completion::Refused(refused);
                }
            };
            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            (ticket, token)
        };

        let generation = ticket.generation();
        let image = ticket.image().clone();
        self.observer.on_submit_start(image.file_name(), image.len());
        let start = Instant::now();

        let result = tokio::select! {
            _ = token.cancelled() => None,
            r = self.transport.submit(&image) => Some(r),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let Some(result) = result else {
            info!("Request for generation {} cancelled after {}ms", generation, elapsed_ms);
            self.observer.on_discarded(generation);
            return Completion::Discarded { generation };
        };

        let report = result.as_ref().map(String::clone).map_err(|e| e.to_string());
        let completion = {
            let mut inner = self.lock();
            let completion = inner.form.complete(ticket, result);
            if matches!(completion, Completion::Applied(_)) {
                inner.cancel = None;
            }
            completion
        };

        match (&completion, report) {
            (Completion::Applied(_), Ok(number)) => self.observer.on_success(&number, elapsed_ms),
            (Completion::Applied(_), Err(detail)) => self.observer.on_failure(&detail, elapsed_ms),
            (Completion::Discarded { generation }, _) => self.observer.on_discarded(*generation),
            (Completion::Refused(_), _) => {}
        }
        completion
    }

    /// [`FormSession::submit`] on a spawned task.
    pub fn spawn_submit(&self) -> JoinHandle<Completion> {
        let session = self.clone();
        tokio::spawn(async move { session.submit().await })
    }

    /// Cancel whatever is in flight and invalidate its result.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if let Some(token) = inner.cancel.take() {
            token.cancel();
        }
        inner.form.teardown();
    }

    pub fn view(&self) -> FormView {
        self.lock().form.view()
    }

    pub fn outcome(&self) -> Outcome {
        self.lock().form.outcome().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().form.is_loading()
    }

    pub fn can_submit(&self) -> bool {
        self.lock().form.can_submit()
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }
}
