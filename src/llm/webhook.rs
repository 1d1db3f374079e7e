// src/llm/webhook.rs
// Workflow-automation webhook used as a reasoning service

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::{Span, debug, info, instrument};
use uuid::Uuid;

use super::http_client::LlmHttpClient;
use super::provider::{Completion, CompletionRequest, Provider, ReasoningService};

/// Value of the `source` field on every webhook call
const SOURCE_TAG: &str = "querygenius";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    prompt: &'a str,
    timestamp: String,
    source: &'a str,
}

/// Posts prompts to a webhook scenario and returns whatever it answers
pub struct WebhookReasoner {
    url: String,
    http: LlmHttpClient,
}

impl WebhookReasoner {
    pub fn new(url: impl Into<String>, client: reqwest::Client, max_retries: u32) -> Self {
        Self {
            url: url.into(),
            http: LlmHttpClient::from_client(client, max_retries),
        }
    }

    fn render_prompt(request: &CompletionRequest) -> String {
        match request.system {
            Some(ref system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        }
    }
}

#[async_trait]
impl ReasoningService for WebhookReasoner {
    #[instrument(skip(self, request), fields(request_id, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", &request_id);
        let start_time = Instant::now();

        let prompt = Self::render_prompt(&request);
        let payload = WebhookPayload {
            prompt: &prompt,
            timestamp: Utc::now().to_rfc3339(),
            source: SOURCE_TAG,
        };
        let body = serde_json::to_string(&payload)?;

        let reply = self
            .http
            .execute_request_with_retry(&request_id, |client| {
                client
                    .post(&self.url)
                    .header("Content-Type", "application/json")
                    .body(body.clone())
            })
            .await
            .map_err(|e| anyhow::anyhow!("webhook {}", e))?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            request_id = %request_id,
            duration_ms,
            json = reply.is_json(),
            bytes = reply.body.len(),
            "Webhook reply received"
        );
        debug!(request_id = %request_id, "Webhook body: {}", crate::utils::truncate(&reply.body, 500));

        Ok(Completion {
            is_json: reply.is_json(),
            body: reply.body,
        })
    }

    fn provider_type(&self) -> Provider {
        Provider::Webhook
    }
}
