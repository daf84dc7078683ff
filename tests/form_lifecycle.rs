//! Request lifecycle tests for `FormSession` over a scripted transport.
//!
//! The transport hands each submit a oneshot receiver, so every test decides
//! exactly when (and how) the in-flight request settles.

use async_trait::async_trait;
use plate_extract::form::{EXTRACTION_FAILED_MESSAGE, NO_IMAGE_MESSAGE, SUBMITTING_LABEL, SUBMIT_LABEL};
use plate_extract::{
    Completion, ExtractionTransport, FormSession, Outcome, RequestError, SelectedImage,
    SubmissionObserver, SubmitRefused,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

type Reply = Result<String, RequestError>;

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Scripted {
    calls: AtomicUsize,
    pending: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    sent: Mutex<Vec<String>>,
}

impl Scripted {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the reply channel for the next submit.
    fn expect(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push_back(rx);
        tx
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionTransport for Scripted {
    async fn submit(&self, image: &SelectedImage) -> Result<String, RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(image.file_name().to_string());
        let rx = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("submit without a scripted reply");
        rx.await
            .unwrap_or_else(|_| Err(RequestError::Other("reply sender dropped".into())))
    }
}

fn image(name: &str) -> SelectedImage {
    SelectedImage::from_bytes(name, b"\xff\xd8\xff\xe0fake-jpeg".to_vec())
}

fn network_down() -> RequestError {
    RequestError::Connect {
        endpoint: "http://localhost:5000/upload".into(),
        reason: "connection refused".into(),
    }
}

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Yield to spawned tasks until `cond` holds.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ── Precondition ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_without_file_never_hits_network() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());

    let c = session.submit().await;

    assert_eq!(c, Completion::Refused(SubmitRefused::NoImage));
    assert_eq!(transport.calls(), 0);
    let view = session.view();
    assert_eq!(view.error_message(), NO_IMAGE_MESSAGE);
    assert!(!view.submit_enabled);
    assert!(view.preview.is_none());
}

// ── Success / failure ────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_submit_shows_number() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    let reply = transport.expect();
    let handle = session.spawn_submit();
    wait_until(|| transport.calls() == 1).await;

    let view = session.view();
    assert!(view.loading);
    assert!(!view.submit_enabled);
    assert_eq!(view.submit_label, SUBMITTING_LABEL);
    assert!(view.preview.is_some(), "preview stays visible while loading");

    reply.send(Ok("AB123CD".into())).unwrap();
    let c = handle.await.unwrap();

    assert_eq!(c, Completion::Applied(Outcome::Success("AB123CD".into())));
    let view = session.view();
    assert_eq!(view.extracted_number(), "AB123CD");
    assert_eq!(view.error_message(), "");
    assert!(view.submit_enabled);
    assert_eq!(view.submit_label, SUBMIT_LABEL);
    assert_eq!(transport.sent.lock().unwrap().as_slice(), ["car.jpg"]);
}

#[tokio::test]
async fn failed_submit_shows_generic_message() {
    init_tracing();
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    transport.expect().send(Err(network_down())).unwrap();
    let c = session.submit().await;

    assert!(matches!(c, Completion::Applied(Outcome::Failure(_))));
    let view = session.view();
    assert_eq!(view.error_message(), EXTRACTION_FAILED_MESSAGE);
    assert_eq!(view.extracted_number(), "");
    assert!(view.submit_enabled, "re-enabled once the request settles");
}

#[tokio::test]
async fn submit_while_in_flight_is_refused() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    let reply = transport.expect();
    let first = session.spawn_submit();
    wait_until(|| transport.calls() == 1).await;

    assert!(!session.can_submit());
    assert_eq!(
        session.submit().await,
        Completion::Refused(SubmitRefused::InFlight)
    );
    assert_eq!(transport.calls(), 1);

    reply.send(Ok("X1".into())).unwrap();
    first.await.unwrap();
    assert!(session.can_submit());
}

// ── Sequencing ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_then_failure_shows_only_failure() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    transport.expect().send(Ok("AB123CD".into())).unwrap();
    session.submit().await;
    transport.expect().send(Err(network_down())).unwrap();
    session.submit().await;

    assert_eq!(
        session.outcome(),
        Outcome::Failure(EXTRACTION_FAILED_MESSAGE.into())
    );
    assert_eq!(session.view().extracted_number(), "");
}

#[tokio::test]
async fn failure_then_success_shows_only_success() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    transport.expect().send(Err(network_down())).unwrap();
    session.submit().await;

    let reply = transport.expect();
    let handle = session.spawn_submit();
    wait_until(|| transport.calls() == 2).await;
    assert_eq!(
        session.view().error_message(),
        "",
        "starting a submit clears the previous error"
    );

    reply.send(Ok("ZZ999".into())).unwrap();
    handle.await.unwrap();
    assert_eq!(session.outcome(), Outcome::Success("ZZ999".into()));
}

#[tokio::test]
async fn selecting_new_file_clears_previous_result_and_error() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());

    session.select_image(image("a.jpg"));
    transport.expect().send(Ok("AAA111".into())).unwrap();
    session.submit().await;
    session.select_image(image("b.jpg"));
    assert_eq!(session.outcome(), Outcome::None);

    transport.expect().send(Err(network_down())).unwrap();
    session.submit().await;
    session.select_image(image("c.jpg"));
    assert_eq!(session.outcome(), Outcome::None);
    assert_eq!(transport.calls(), 2);
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reselect_cancels_in_flight_request() {
    init_tracing();
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("old.jpg"));

    let stale_reply = transport.expect();
    let handle = session.spawn_submit();
    wait_until(|| transport.calls() == 1).await;

    session.select_image(image("new.jpg"));
    assert!(!session.is_loading());
    assert!(session.can_submit());

    let c = handle.await.unwrap();
    assert!(matches!(c, Completion::Discarded { .. }));
    // the cancelled request dropped its receiver
    assert!(stale_reply.send(Ok("STALE".into())).is_err());
    assert_eq!(session.outcome(), Outcome::None);

    transport.expect().send(Ok("FRESH1".into())).unwrap();
    session.submit().await;
    assert_eq!(session.outcome(), Outcome::Success("FRESH1".into()));
    assert_eq!(
        transport.sent.lock().unwrap().as_slice(),
        ["old.jpg", "new.jpg"]
    );
}

#[tokio::test]
async fn teardown_discards_outstanding_request() {
    let transport = Scripted::new();
    let session = FormSession::new(transport.clone());
    session.select_image(image("car.jpg"));

    let _reply = transport.expect();
    let handle = session.spawn_submit();
    wait_until(|| transport.calls() == 1).await;

    session.teardown();
    assert!(matches!(
        handle.await.unwrap(),
        Completion::Discarded { .. }
    ));
    assert_eq!(session.outcome(), Outcome::None);
    assert!(!session.is_loading());
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl SubmissionObserver for Events {
    fn on_image_selected(&self, file_name: &str, _byte_len: usize) {
        self.0.lock().unwrap().push(format!("select {file_name}"));
    }
    fn on_submit_start(&self, file_name: &str, _byte_len: usize) {
        self.0.lock().unwrap().push(format!("start {file_name}"));
    }
    fn on_success(&self, number: &str, _elapsed_ms: u64) {
        self.0.lock().unwrap().push(format!("ok {number}"));
    }
    fn on_failure(&self, detail: &str, _elapsed_ms: u64) {
        self.0.lock().unwrap().push(format!("fail {detail}"));
    }
    fn on_discarded(&self, _generation: u64) {
        self.0.lock().unwrap().push("discarded".into());
    }
}

#[tokio::test]
async fn observer_sees_lifecycle_with_diagnostic_detail() {
    let transport = Scripted::new();
    let events = Arc::new(Events::default());
    let session = FormSession::new(transport.clone()).with_observer(events.clone());

    session.select_image(image("car.jpg"));
    transport.expect().send(Ok("AB123CD".into())).unwrap();
    session.submit().await;
    transport.expect().send(Err(network_down())).unwrap();
    session.submit().await;

    let log = events.0.lock().unwrap().clone();
    assert_eq!(log[0], "select car.jpg");
    assert_eq!(log[1], "start car.jpg");
    assert_eq!(log[2], "ok AB123CD");
    assert_eq!(log[3], "start car.jpg");
    assert!(log[4].starts_with("fail could not connect"), "got {:?}", log[4]);
    // the user still only sees the generic text
    assert_eq!(session.view().error_message(), EXTRACTION_FAILED_MESSAGE);
}
