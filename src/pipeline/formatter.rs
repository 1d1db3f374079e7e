// src/pipeline/formatter.rs
// Narrative formatting of result rows

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::prompts;
use super::types::{Outcome, Question, ResultRows};
use crate::llm::{CompletionRequest, ReasoningService};

pub struct Formatter {
    reasoner: Option<Arc<dyn ReasoningService>>,
    timeout: Duration,
}

impl Formatter {
    pub fn new(reasoner: Option<Arc<dyn ReasoningService>>, timeout: Duration) -> Self {
        Self { reasoner, timeout }
    }

    /// Narrative for `rows`. Never fails: any problem yields the plain
    /// rendering from [`fallback_rendering`].
    pub async fn format(&self, question: &Question, label: &str, rows: &ResultRows) -> Outcome<String> {
        match self.narrate(question, label, rows).await {
            Ok(text) => {
                info!(chars = text.len(), "Narrative ready");
                Outcome::Resolved(text)
            }
            Err(cause) => {
                warn!(cause = %cause, "Narrative unavailable, rendering rows");
                Outcome::degraded(fallback_rendering(label, rows), cause)
            }
        }
    }

    async fn narrate(&self, question: &Question, label: &str, rows: &ResultRows) -> Result<String, String> {
        let reasoner = self
            .reasoner
            .as_ref()
            .ok_or("no reasoning service configured")?;
        let rows_json = serde_json::to_string(rows).map_err(|e| e.to_string())?;
        let request = CompletionRequest::new(prompts::narrative(question.as_str(), label, &rows_json))
            .with_system(prompts::NARRATIVE_SYSTEM)
            .with_temperature(0.2)
            .with_max_tokens(2000);

        let completion = tokio::time::timeout(self.timeout, reasoner.complete(request))
            .await
            .map_err(|_| format!("formatting timed out after {:?}", self.timeout))?
            .map_err(|e| e.to_string())?;

        completion
            .payload()
            .ok_or("narrative reply is not JSON")?
            .get("response")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| "narrative reply has no response text".to_string())
    }
}

/// Plain rendering: header, then one line per row with fields joined by ` | `
pub fn fallback_rendering(label: &str, rows: &ResultRows) -> String {
    let body = rows
        .rows()
        .iter()
        .map(|row| ResultRows::row_fields(row).join(" | "))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{} Data Analysis\n\nBased on the available data:\n\n{}", label, body)
}
