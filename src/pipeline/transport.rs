//! Transport: send the selected image to the extraction service.
//!
//! [`ExtractionTransport`] is the only seam between the form and the network.
//! The form never sees an HTTP client; it hands a [`SelectedImage`] to
//! whatever transport it was given and gets back either the `number` text
//! or a [`RequestError`]. Tests substitute an in-memory fake.
//!
//! ## Request
//!
//! `POST <endpoint>` with a `multipart/form-data` body holding exactly one
//! part named `image`. There is no retry loop. A request settles once,
//! as a success or as a failure.
//!
//! ## Response
//!
//! On 2xx the body is parsed as JSON and the `number` field is read. Strings
//! are taken verbatim and other scalars are rendered as their JSON text,
//! since the form shows whatever it receives. A missing, `null` or compound
//! `number` gives an empty string. Everything else (non-2xx, connection
//! failure, non-JSON body) becomes a [`RequestError`].

use crate::config::{UploadConfig, IMAGE_FIELD};
use crate::error::{PlateError, RequestError};
use crate::pipeline::input::SelectedImage;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can turn an image into extracted plate text.
#[async_trait]
pub trait ExtractionTransport: Send + Sync {
    /// Upload `image` and return the service's `number` value.
    async fn submit(&self, image: &SelectedImage) -> Result<String, RequestError>;

    /// Where requests go, for log lines.
    fn endpoint(&self) -> &str {
        "<in-memory>"
    }
}

/// The reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &UploadConfig) -> Result<Self, PlateError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PlateError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn build_form(image: &SelectedImage) -> Result<Form, RequestError> {
        let part = Part::stream_with_length(image.shared_bytes(), image.len() as u64)
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| RequestError::Other(format!("invalid MIME type: {e}")))?;
        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

#[async_trait]
impl ExtractionTransport for HttpTransport {
    async fn submit(&self, image: &SelectedImage) -> Result<String, RequestError> {
        let start = Instant::now();
        info!(
            "Uploading {} ({} bytes) to {}",
            image.file_name(),
            image.len(),
            self.endpoint
        );

        let form = Self::build_form(image)?;
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RequestError::from_reqwest(&self.endpoint, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::from_reqwest(&self.endpoint, &e))?;

        debug!(
            "{} answered HTTP {} in {}ms ({} bytes)",
            self.endpoint,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        if !status.is_success() {
            warn!("Extraction service rejected upload: HTTP {}", status.as_u16());
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: error_text(&body),
            });
        }

        parse_number(&body)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Pull `number` out of a success body.
pub fn parse_number(body: &str) -> Result<String, RequestError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| RequestError::Decode {
            reason: e.to_string(),
        })?;

    Ok(match value.get("number") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(n @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => n.to_string(),
        _ => String::new(),
    })
}

/// The service reports failures as `{"error": "..."}`; keep just that text
/// when present, the raw body otherwise.
fn error_text(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
