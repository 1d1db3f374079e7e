// src/pipeline/classifier.rs
// Special-source vs general-path classification

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::prompts;
use super::types::{Classification, Outcome, Question, Stage};
use crate::error::{QueryError, Result};
use crate::llm::{Completion, CompletionRequest, ReasoningService};

pub struct Classifier {
    reasoner: Arc<dyn ReasoningService>,
    source_name: String,
    timeout: Duration,
}

impl Classifier {
    pub fn new(reasoner: Arc<dyn ReasoningService>, source_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            reasoner,
            source_name: source_name.into(),
            timeout,
        }
    }

    /// A transport failure or timeout aborts the request. An unreadable
    /// reply degrades to the general path.
    pub async fn classify(&self, question: &Question) -> Result<Outcome<Classification>> {
        let request = CompletionRequest::new(prompts::classification(question.as_str(), &self.source_name));
        let completion = tokio::time::timeout(self.timeout, self.reasoner.complete(request))
            .await
            .map_err(|_| QueryError::Timeout(Stage::Classifying))?
            .map_err(|e| {
                warn!(error = %e, "Classification call failed");
                QueryError::upstream(Stage::Classifying, e.to_string())
            })?;

        let outcome = read_label(&completion);
        match &outcome {
            Outcome::Resolved(label) => info!(?label, "Question classified"),
            Outcome::Degraded { cause, .. } => {
                debug!(cause = %cause, "Classification reply unreadable, using general path")
            }
        }
        Ok(outcome)
    }
}

/// Only a literal JSON `true` selects the special source
fn read_label(completion: &Completion) -> Outcome<Classification> {
    let Some(payload) = completion.payload() else {
        return Outcome::degraded(Classification::General, "classification reply is not JSON");
    };
    match payload.get(prompts::CLASSIFICATION_KEY) {
        Some(Value::Bool(true)) => Outcome::Resolved(Classification::SpecialSource),
        Some(Value::Bool(false)) => Outcome::Resolved(Classification::General),
        Some(other) => Outcome::degraded(
            Classification::General,
            format!("{} is not a boolean: {}", prompts::CLASSIFICATION_KEY, other),
        ),
        None => Outcome::degraded(
            Classification::General,
            format!("reply has no {}", prompts::CLASSIFICATION_KEY),
        ),
    }
}
