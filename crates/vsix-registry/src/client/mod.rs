//! HTTP client for downloading extension packages and companion bundles

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONNECTION, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use vsix_core::error::VsixError;

use crate::ratelimit::RateLimitStatus;
use crate::RegistryResult;

/// Result of a single GET against an upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to `path`
    Downloaded {
        path: Utf8PathBuf,
        bytes: u64,
        rate_limit: RateLimitStatus,
    },
    /// The server answered 429; nothing was written
    RateLimited(RateLimitStatus),
}

/// Download client sending a fixed header set on every request
#[derive(Debug, Clone)]
pub struct VsixClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    user_agent: String,
}

impl VsixClient {
    /// Create a client announcing `user_agent` on every request
    pub fn new(user_agent: &str) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .gzip(true)
            .deflate(true)
            .default_headers(Self::fixed_headers(user_agent)?)
            .build()
            .map_err(|e| VsixError::transport("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn fixed_headers(user_agent: &str) -> RegistryResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| VsixError::ConfigValidation {
                field: "fetch.user-agent".to_string(),
                reason: e.to_string(),
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        Ok(headers)
    }

    /// GET `url` and stream a successful body into `dest`.
    ///
    /// A 429 is reported as [`FetchOutcome::RateLimited`]; every other
    /// non-success status is a transport error.
    pub async fn download(&self, url: &Url, dest: &Utf8Path) -> RegistryResult<FetchOutcome> {
        debug!("GET {}", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| VsixError::transport(format!("Failed to fetch {}", url), e))?;

        let status = response.status();
        let rate_limit = RateLimitStatus::from_headers(response.headers());
        debug!("{} -> {} ({:?})", url, status, rate_limit);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(FetchOutcome::RateLimited(rate_limit));
        }
        if !status.is_success() {
            return Err(VsixError::http_status(url.as_str(), status.as_u16()));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| VsixError::io(format!("Failed to create {}", dest), e))?;

        let mut bytes = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| VsixError::transport(format!("Failed to read body of {}", url), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| VsixError::io(format!("Failed to write {}", dest), e))?;
            bytes += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| VsixError::io(format!("Failed to write {}", dest), e))?;

        Ok(FetchOutcome::Downloaded {
            path: dest.to_path_buf(),
            bytes,
            rate_limit,
        })
    }
}
