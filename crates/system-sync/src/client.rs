//! HTTP client for deployment-to-deployment sync transfer.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Result, SystemSyncError};
use crate::types::{ExportPackage, PushEnvelope, EXPORT_ENDPOINT_PATH, SYNC_SOURCE};

/// Default timeout for sync transfer requests. Packages carry a full dump
/// and code archive, so this is deliberately generous.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Header identifying the sending deployment on push transfers.
pub const SYNC_SOURCE_HEADER: &str = "x-sync-source";

/// Client for the sync endpoints of a peer deployment.
///
/// Every request is a single attempt; callers needing resilience wrap
/// invocations externally.
#[derive(Debug, Clone)]
pub struct SystemSyncClient {
    client: reqwest::Client,
}

impl Default for SystemSyncClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSyncClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| SystemSyncError::configuration("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(SYNC_SOURCE_HEADER, HeaderValue::from_static(SYNC_SOURCE));
        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[SystemSync] Response status: {}", status);
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[SystemSync] Response error ({}): {}", status, preview);
    }

    /// POST a push envelope to the target deployment.
    ///
    /// Returns the remote status code on success; a non-success status
    /// becomes a [`SystemSyncError::Transfer`] carrying the remote status
    /// and body verbatim.
    pub async fn push_package(
        &self,
        target_url: &str,
        api_key: &str,
        envelope: &PushEnvelope,
    ) -> Result<u16> {
        debug!(
            "[SystemSync] Pushing package ({} bytes) to {}",
            envelope.metadata.size, target_url
        );
        let response = self
            .client
            .post(target_url)
            .headers(self.headers(api_key)?)
            .json(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);
        if !status.is_success() {
            return Err(SystemSyncError::transfer(status.as_u16(), body));
        }
        Ok(status.as_u16())
    }

    /// GET the export bundle from a source deployment.
    pub async fn fetch_export(&self, source_url: &str, api_key: &str) -> Result<ExportPackage> {
        let url = format!(
            "{}{}",
            source_url.trim_end_matches('/'),
            EXPORT_ENDPOINT_PATH
        );
        debug!("[SystemSync] Fetching export from {}", url);
        let response = self
            .client
            .get(&url)
            .headers(self.headers(api_key)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);
        if !status.is_success() {
            return Err(SystemSyncError::fetch(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|err| {
            SystemSyncError::fetch(
                status.as_u16(),
                format!("Failed to parse export package: {}", err),
            )
        })
    }
}
