//! Configuration for talking to the extraction service.
//!
//! All client behaviour is controlled through [`UploadConfig`], built via its
//! [`UploadConfigBuilder`]. The builder validates in [`UploadConfigBuilder::build`]
//! so a malformed endpoint is reported before any file is read.

use crate::error::PlateError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Where the service listens when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/upload";

/// Multipart field name the service reads the image from.
pub const IMAGE_FIELD: &str = "image";

/// Configuration for uploads to the extraction service.
///
/// # Example
/// ```rust
/// use plate_extract::UploadConfig;
///
/// let config = UploadConfig::builder()
///     .endpoint("http://127.0.0.1:5000/upload")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Full URL of the upload route. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Whole-request timeout in seconds. Default: `None`.
    ///
    /// `None` leaves reqwest's own behaviour in place, so a submitted
    /// request runs until the service answers or the connection fails.
    pub timeout_secs: Option<u64>,

    /// `User-Agent` header sent with each upload.
    pub user_agent: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            user_agent: format!("plate-extract/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl UploadConfig {
    /// Create a new builder for `UploadConfig`.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, PlateError> {
        let c = &self.config;
        let url = Url::parse(&c.endpoint).map_err(|e| {
            PlateError::InvalidConfig(format!("Endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PlateError::InvalidConfig(format!(
                "Endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.timeout_secs == Some(0) {
            return Err(PlateError::InvalidConfig(
                "Timeout must be ≥ 1 second when set".into(),
            ));
        }
        Ok(self.config)
    }
}
