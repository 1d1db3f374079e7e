// src/pipeline/generator.rs
// Question -> artifact generation (relational text and REST descriptors)

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::prompts;
use super::types::{Outcome, Question, RelationalOutcome, RestDescriptor, RestTable, Stage};
use crate::error::{QueryError, Result};
use crate::llm::{CompletionRequest, ReasoningService};
use crate::utils::truncate;

/// Asks for query text the relational backend can run directly
pub struct RelationalGenerator {
    reasoner: Arc<dyn ReasoningService>,
    timeout: Duration,
}

impl RelationalGenerator {
    pub fn new(reasoner: Arc<dyn ReasoningService>, timeout: Duration) -> Self {
        Self { reasoner, timeout }
    }

    pub async fn generate(&self, question: &Question) -> Result<RelationalOutcome> {
        let request = CompletionRequest::new(prompts::relational(question.as_str()));
        let completion = tokio::time::timeout(self.timeout, self.reasoner.complete(request))
            .await
            .map_err(|_| QueryError::Timeout(Stage::Generating))?
            .map_err(|e| {
                warn!(error = %e, "Query generation call failed");
                QueryError::upstream(Stage::Generating, e.to_string())
            })?;

        let outcome = read_relational(&completion.answer_text());
        match outcome {
            RelationalOutcome::Query(ref q) => info!(query = %truncate(q, 200), "Query generated"),
            RelationalOutcome::Declined { ref reason, .. } => info!(reason = %reason, "Query generation declined"),
            RelationalOutcome::Verbatim(_) => info!("Reply is not a query envelope, answering verbatim"),
        }
        Ok(outcome)
    }
}

/// Interpret the unwrapped answer text. No structural check is made on the
/// query itself.
fn read_relational(text: &str) -> RelationalOutcome {
    let parsed = serde_json::from_str::<Value>(text.trim()).ok();
    let field = |key: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(query) = field("query") {
        RelationalOutcome::Query(query)
    } else if let Some(reason) = field("error") {
        RelationalOutcome::Declined {
            reason,
            reply: text.to_string(),
        }
    } else {
        RelationalOutcome::Verbatim(text.to_string())
    }
}

/// Asks for a REST descriptor, falling back to keyword heuristics
pub struct DescriptorGenerator {
    reasoner: Option<Arc<dyn ReasoningService>>,
    timeout: Duration,
    default_limit: u32,
}

impl DescriptorGenerator {
    pub fn new(reasoner: Option<Arc<dyn ReasoningService>>, timeout: Duration, default_limit: u32) -> Self {
        Self {
            reasoner,
            timeout,
            default_limit,
        }
    }

    /// Never fails: every problem degrades to [`heuristic_descriptor`]
    pub async fn generate(&self, question: &Question) -> Outcome<RestDescriptor> {
        let outcome = match self.ask(question).await {
            Ok(descriptor) => Outcome::Resolved(descriptor),
            Err(cause) => {
                warn!(cause = %cause, "Using heuristic descriptor");
                Outcome::degraded(heuristic_descriptor(question.as_str(), self.default_limit), cause)
            }
        };
        info!(descriptor = ?outcome.value(), degraded = outcome.is_degraded(), "Descriptor ready");
        outcome
    }

    async fn ask(&self, question: &Question) -> std::result::Result<RestDescriptor, String> {
        let reasoner = self
            .reasoner
            .as_ref()
            .ok_or("no reasoning service configured")?;
        let request = CompletionRequest::new(prompts::descriptor(question.as_str()))
            .with_system(prompts::DESCRIPTOR_SYSTEM)
            .with_temperature(0.1)
            .with_max_tokens(500);

        let completion = tokio::time::timeout(self.timeout, reasoner.complete(request))
            .await
            .map_err(|_| format!("descriptor generation timed out after {:?}", self.timeout))?
            .map_err(|e| e.to_string())?;
        let payload = completion.payload().ok_or("descriptor reply is not JSON")?;

        let mut descriptor = RestDescriptor::from_value(&payload)?;
        if let Some(order) = descriptor.drop_invalid_order() {
            warn!(order = %order, table = %descriptor.table, "Dropping order on a column the table lacks");
        }
        Ok(descriptor)
    }
}

/// Keyword match over the lowercased question
pub fn heuristic_descriptor(question: &str, limit: u32) -> RestDescriptor {
    let q = question.to_lowercase();
    if q.contains("transaction") {
        let select = if q.contains("customer") { "*,customers(*)" } else { "*" };
        return RestDescriptor::new(RestTable::Transactions, select, limit);
    }
    if q.contains("customer") {
        return RestDescriptor::new(RestTable::Customers, "*", limit);
    }
    if q.contains("product") {
        return RestDescriptor::new(RestTable::Products, "*", limit);
    }
    RestDescriptor::new(RestTable::Transactions, "*", limit)
}
