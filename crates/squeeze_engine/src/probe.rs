use std::time::Duration;

use engine_logging::engine_debug;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::{ProbeError, ProbeFailure, ProbeVerdict};

/// Limits for the verification probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Images at or below this size are not worth the round trip through
    /// the proxy.
    pub min_content_bytes: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            min_content_bytes: 1024,
        }
    }
}

/// Header-only pre-flight check confirming a URL is a compressible image
/// before a deferred redirect commits to it.
#[async_trait::async_trait]
pub trait ImageProber: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeVerdict, ProbeError>;
}

/// Production prober: one HEAD request with bounded timeouts.
#[derive(Debug, Clone)]
pub struct ReqwestProber {
    settings: ProbeSettings,
}

impl ReqwestProber {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ProbeError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| ProbeError::new(ProbeFailure::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ImageProber for ReqwestProber {
    async fn probe(&self, url: &str) -> Result<ProbeVerdict, ProbeError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ProbeError::new(ProbeFailure::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let response = client.head(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        // A rejected HEAD says nothing about the target itself; assume an
        // image and compress opportunistically. Unverified against every
        // proxy deployment; revisit with the real proxy contract.
        if status == StatusCode::METHOD_NOT_ALLOWED {
            return Ok(ProbeVerdict::Redirect);
        }
        if !status.is_success() {
            return Ok(ProbeVerdict::NoRedirect);
        }

        // reqwest reports no body length for HEAD; read the header itself.
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("image"));

        let verdict = match content_length {
            Some(length) if is_image && length > self.settings.min_content_bytes => {
                ProbeVerdict::Redirect
            }
            _ => ProbeVerdict::NoRedirect,
        };
        engine_debug!("probe {url}: status={status} verdict={verdict:?}");
        Ok(verdict)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::new(ProbeFailure::Timeout, err.to_string());
    }
    ProbeError::new(ProbeFailure::Network, err.to_string())
}
