// src/llm/http_client.rs
// HTTP plumbing shared by the reasoning providers

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Default base backoff duration between retries (doubles each attempt)
const DEFAULT_BASE_BACKOFF_MS: u64 = 500;

/// Body of a successful reply plus the declared content type
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub body: String,
    pub content_type: Option<String>,
}

impl HttpReply {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// HTTP client wrapper with optional retry of transient failures
pub struct LlmHttpClient {
    client: Client,
    /// Retries after the first attempt; zero means a single attempt
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl LlmHttpClient {
    /// Create from an existing reqwest::Client (timeouts live on the client)
    pub fn from_client(client: Client, max_attempts: u32) -> Self {
        Self {
            client,
            max_attempts,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
        }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Execute HTTP request with retry logic using a custom request builder.
    ///
    /// The `build_request` closure is called on each attempt, allowing callers
    /// to customize URL, headers, and auth. Retries only 429, 5xx and
    /// connect/timeout errors.
    pub async fn execute_request_with_retry<F>(
        &self,
        request_id: &str,
        build_request: F,
    ) -> Result<HttpReply>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let mut attempts = 0;
        let mut backoff = self.base_backoff;

        loop {
            match build_request(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let error_body = response.text().await.unwrap_or_default();

                        if attempts < self.max_attempts
                            && (status.as_u16() == 429 || status.is_server_error())
                        {
                            warn!(
                                request_id = %request_id,
                                status = %status,
                                "Transient error, retrying in {:?}...",
                                backoff
                            );
                            tokio::time::sleep(backoff).await;
                            attempts += 1;
                            backoff *= 2;
                            continue;
                        }

                        return Err(anyhow!(
                            "returned {}: {}",
                            status,
                            crate::utils::truncate(&error_body, 200)
                        ));
                    }

                    let content_type = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let body = response.text().await?;
                    return Ok(HttpReply { body, content_type });
                }
                Err(e) => {
                    // Only connection/timeout errors are safe to retry
                    if attempts < self.max_attempts && (e.is_connect() || e.is_timeout()) {
                        warn!(
                            request_id = %request_id,
                            error = %e,
                            "Request failed (connect/timeout), retrying in {:?}...",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        backoff *= 2;
                        continue;
                    }
                    return Err(anyhow!("request failed: {}", e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client() {
        let client = LlmHttpClient::from_client(Client::new(), 2);
        assert_eq!(client.max_attempts, 2);
        assert_eq!(client.base_backoff, Duration::from_millis(DEFAULT_BASE_BACKOFF_MS));
        let _inner = client.inner();
    }

    #[test]
    fn test_reply_json_detection() {
        let reply = HttpReply {
            body: "{}".into(),
            content_type: Some("application/json; charset=utf-8".into()),
        };
        assert!(reply.is_json());

        let reply = HttpReply {
            body: "Accepted".into(),
            content_type: Some("text/plain".into()),
        };
        assert!(!reply.is_json());

        let reply = HttpReply {
            body: "".into(),
            content_type: None,
        };
        assert!(!reply.is_json());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let client = LlmHttpClient {
            client: Client::new(),
            max_attempts: 1,
            base_backoff: Duration::from_millis(10),
        };
        let result = client
            .execute_request_with_retry("test", |c| c.post("http://127.0.0.1:1").body("{}"))
            .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("request failed"), "got: {}", err);
    }
}
