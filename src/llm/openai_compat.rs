// src/llm/openai_compat.rs
// OpenAI-compatible chat completions client

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{Span, info, instrument};
use uuid::Uuid;

use super::http_client::LlmHttpClient;
use super::provider::{Completion, CompletionRequest, Provider, ReasoningService};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completion request (OpenAI-compatible format)
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions reasoner
pub struct OpenAiReasoner {
    api_key: String,
    model: String,
    endpoint: String,
    http: LlmHttpClient,
}

impl OpenAiReasoner {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        client: reqwest::Client,
        max_retries: u32,
    ) -> Self {
        Self {
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            http: LlmHttpClient::from_client(client, max_retries),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let chat = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        Ok(serde_json::to_string(&chat)?)
    }
}

/// Pull the first choice's message content out of a completion body
fn parse_chat_response(body: &str) -> Result<String> {
    let data: ChatResponse =
        serde_json::from_str(body).map_err(|e| anyhow!("Failed to parse chat response: {}", e))?;
    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow!("No response content from chat completion"))
}

#[async_trait]
impl ReasoningService for OpenAiReasoner {
    #[instrument(skip(self, request), fields(request_id, model = %self.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", &request_id);
        let start_time = Instant::now();

        let body = self.build_body(&request)?;
        let reply = self
            .http
            .execute_request_with_retry(&request_id, |client| {
                client
                    .post(&self.endpoint)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .body(body.clone())
            })
            .await
            .map_err(|e| anyhow!("chat completion {}", e))?;

        let content = parse_chat_response(&reply.body)?;
        info!(
            request_id = %request_id,
            duration_ms = start_time.elapsed().as_millis() as u64,
            content_len = content.len(),
            "Chat completion finished"
        );

        Ok(Completion::text(content))
    }

    fn provider_type(&self) -> Provider {
        Provider::OpenAi
    }
}
