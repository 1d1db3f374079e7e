// src/llm/provider.rs
// Reasoning service abstraction layer

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Reasoning backends the pipeline can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Workflow-automation webhook (prompt in, JSON or text out)
    Webhook,
    /// OpenAI-compatible chat completions
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook => write!(f, "webhook"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// A single prompt sent to a reasoning service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// System instruction; providers without a system role prepend it
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A successful reply. The body is kept raw; stages decide how to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub body: String,
    /// Whether the transport declared the body as JSON
    pub is_json: bool,
}

impl Completion {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            is_json: true,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            is_json: false,
        }
    }

    /// Answer text: for JSON bodies the `response` field, then `message`,
    /// then the whole body; plain-text bodies are returned as-is
    pub fn answer_text(&self) -> String {
        if !self.is_json {
            return self.body.clone();
        }
        match serde_json::from_str::<Value>(&self.body) {
            Ok(value) => envelope_text(&value).unwrap_or_else(|| value.to_string()),
            Err(_) => self.body.clone(),
        }
    }

    /// Structured payload of the reply, looking through one level of
    /// `response`/`message` wrapping when the wrapped text is itself JSON
    pub fn payload(&self) -> Option<Value> {
        let outer: Value = serde_json::from_str(self.body.trim()).ok()?;
        if let Some(inner) = envelope_text(&outer)
            .and_then(|text| serde_json::from_str::<Value>(text.trim()).ok())
            .filter(Value::is_object)
        {
            return Some(inner);
        }
        Some(outer)
    }
}

fn envelope_text(value: &Value) -> Option<String> {
    ["response", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Trait for reasoning clients - all providers implement this
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Send one prompt and wait for the reply. A non-success transport
    /// response is an error.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Get the provider type
    fn provider_type(&self) -> Provider;
}
