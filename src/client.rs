//! Client for a remote recovery service
//!
//! Used by `sanctuary recover --remote` to talk to another `sanctuary serve`.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::recovery::RecoveryResult;
use crate::server::{ErrorBody, RecoverRequest};

/// Default service URL, matching `sanctuary serve` defaults
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Health check response
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub version: String,
}

/// HTTP client for the recovery API
pub struct RecoveryClient {
    base_url: String,
    client: reqwest::Client,
}

impl RecoveryClient {
    /// Create a client for `url`; a trailing `/recover/` path is accepted
    pub fn with_url(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .user_agent(format!("code-sanctuary/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = url
            .trim_end_matches('/')
            .trim_end_matches("/recover")
            .to_string();

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the service is healthy
    pub async fn health_check(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to recovery service")?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed: {}", response.status());
        }

        response
            .json::<HealthResponse>()
            .await
            .context("Failed to parse health response")
    }

    /// Ask the service for the best-matching file
    pub async fn recover(&self, broken_code: &str) -> Result<RecoveryResult> {
        let url = format!("{}/recover/", self.base_url);

        let request = RecoverRequest {
            broken_code: broken_code.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Backend error: could not connect to recovery service")?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Backend error ({}): {}", status, message);
        }

        response
            .json::<RecoveryResult>()
            .await
            .context("Failed to parse recovery response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_normalization() {
        let client = RecoveryClient::with_url("http://localhost:8000/recover/").unwrap();
        assert_eq!(client.base_url(), DEFAULT_SERVICE_URL);
        let client = RecoveryClient::with_url("http://example.com/").unwrap();
        assert_eq!(client.base_url(), "http://example.com");
    }

    #[tokio::test]
    async fn test_recover_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recover/"))
            .and(body_json(json!({"broken_code": "def add(a, b)"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggested_file": "math_utils.py",
                "similarity_score": 0.93
            })))
            .mount(&server)
            .await;

        let client = RecoveryClient::with_url(&server.uri()).unwrap();
        let result = client.recover("def add(a, b)").await.unwrap();
        assert_eq!(result.suggested_file, "math_utils.py");
    }

    #[tokio::test]
    async fn test_recover_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recover/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "no candidate files found in data/sample"
            })))
            .mount(&server)
            .await;

        let client = RecoveryClient::with_url(&server.uri()).unwrap();
        let err = client.recover("x").await.unwrap_err();
        assert!(err.to_string().contains("no candidate files"));
    }
}
