// src/llm/mod.rs
// Reasoning service clients (workflow webhook, OpenAI-compatible chat)

mod http_client;
mod openai_compat;
mod provider;
mod webhook;

pub use http_client::{HttpReply, LlmHttpClient};
pub use openai_compat::OpenAiReasoner;
pub use provider::{Completion, CompletionRequest, Provider, ReasoningService};
pub use webhook::WebhookReasoner;
