// src/pipeline/orchestrator.rs
// Sequences classification, generation, execution, formatting and persistence

use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use super::classifier::Classifier;
use super::formatter::Formatter;
use super::generator::{DescriptorGenerator, RelationalGenerator};
use super::types::{Artifact, Classification, Question, RelationalOutcome, ResultRows, SheetRef, Stage};
use crate::config::AppConfig;
use crate::db;
use crate::error::{QueryError, Result};
use crate::llm::{OpenAiReasoner, ReasoningService, WebhookReasoner};
use crate::sources::{RestSource, SheetSource, SourceExecutor, SqlSource};
use crate::store::{QueryRecord, QueryStore};

/// Fallback-header label for relational results
const DATABASE_LABEL: &str = "Database";

struct SpecialSource {
    classifier: Classifier,
    sheet: SheetRef,
}

/// One linear pipeline per request. Holds no per-request state.
pub struct QueryPipeline {
    special: Option<SpecialSource>,
    relational: Option<RelationalGenerator>,
    descriptors: DescriptorGenerator,
    formatter: Formatter,
    structured_formatter: Formatter,
    executor: SourceExecutor,
    store: Arc<dyn QueryStore>,
    stage_timeout: Duration,
}

impl QueryPipeline {
    /// Bare pipeline: no classification, heuristic descriptors, plain
    /// rendering. Use the `with_*` methods to add reasoning services.
    pub fn new(executor: SourceExecutor, store: Arc<dyn QueryStore>, stage_timeout: Duration, rest_limit: u32) -> Self {
        Self {
            special: None,
            relational: None,
            descriptors: DescriptorGenerator::new(None, stage_timeout, rest_limit),
            formatter: Formatter::new(None, stage_timeout),
            structured_formatter: Formatter::new(None, stage_timeout),
            executor,
            store,
            stage_timeout,
        }
    }

    pub fn with_special_source(mut self, classifier: Classifier, sheet: SheetRef) -> Self {
        self.special = Some(SpecialSource { classifier, sheet });
        self
    }

    pub fn with_relational(mut self, generator: RelationalGenerator) -> Self {
        self.relational = Some(generator);
        self
    }

    pub fn with_descriptors(mut self, generator: DescriptorGenerator) -> Self {
        self.descriptors = generator;
        self
    }

    /// Formatter for the classified route
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Formatter for the structured route
    pub fn with_structured_formatter(mut self, formatter: Formatter) -> Self {
        self.structured_formatter = formatter;
        self
    }

    /// Wire every stage from configuration: the webhook drives the
    /// classified route, the chat-completions service the structured one.
    pub async fn from_config(config: &AppConfig, store: Arc<dyn QueryStore>) -> Result<Self> {
        let client = crate::http::create_shared_client();
        let timeout = config.stage_timeout;
        let retries = config.reasoning.max_retries;

        let webhook: Option<Arc<dyn ReasoningService>> = config.reasoning.webhook_url.as_ref().map(|url| {
            Arc::new(WebhookReasoner::new(url.clone(), client.clone(), retries)) as Arc<dyn ReasoningService>
        });
        let chat: Option<Arc<dyn ReasoningService>> = config.api_keys.openai.as_ref().map(|key| {
            Arc::new(OpenAiReasoner::new(
                key.clone(),
                &config.reasoning.openai_base_url,
                config.reasoning.openai_model.clone(),
                client.clone(),
                retries,
            )) as Arc<dyn ReasoningService>
        });

        let (analytics_url, read_only) = config.analytics_source();
        let sql = match db::create_pool(analytics_url, read_only).await {
            Ok(pool) => Some(SqlSource::new(pool)),
            Err(e) => {
                warn!(error = %e, "Relational backend unavailable");
                None
            }
        };
        let executor = SourceExecutor::new(
            sql,
            RestSource::new(
                client.clone(),
                config.rest.base_url.clone(),
                config.api_keys.rest.clone(),
                config.rest.default_limit,
            ),
            SheetSource::new(client, config.sheet_base_url.clone()),
        );

        let mut pipeline = Self::new(executor, store, timeout, config.rest.default_limit)
            .with_descriptors(DescriptorGenerator::new(chat.clone(), timeout, config.rest.default_limit))
            .with_formatter(Formatter::new(webhook.clone(), timeout))
            .with_structured_formatter(Formatter::new(chat, timeout));

        if let Some(ref reasoner) = webhook {
            pipeline = pipeline.with_relational(RelationalGenerator::new(reasoner.clone(), timeout));
            if let Some(ref special) = config.special_source {
                pipeline = pipeline.with_special_source(
                    Classifier::new(reasoner.clone(), special.name.clone(), timeout),
                    SheetRef {
                        sheet_id: special.sheet_id.clone(),
                        label: special.name.clone(),
                    },
                );
            }
        }

        info!(
            webhook = webhook.is_some(),
            special_source = pipeline.special.is_some(),
            "Query pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn store(&self) -> &Arc<dyn QueryStore> {
        &self.store
    }

    /// Classified route: special source or generated SQL
    #[instrument(skip(self, raw), fields(request_id))]
    pub async fn answer(&self, raw: &str) -> Result<QueryRecord> {
        let question = Question::parse(raw)?;
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());
        debug!(stage = %Stage::Received, "Question accepted");

        let response = match self.classify(&question).await? {
            (Classification::SpecialSource, Some(sheet)) => {
                let rows = self.execute(Artifact::Sheet(sheet.clone())).await?;
                self.format(&self.formatter, &question, &sheet.label, &rows).await
            }
            _ => self.answer_relational(&question).await?,
        };

        self.persist(&question, &response).await
    }

    /// Structured route: descriptor generation against the REST endpoint,
    /// no classification
    #[instrument(skip(self, raw), fields(request_id))]
    pub async fn answer_structured(&self, raw: &str) -> Result<QueryRecord> {
        let question = Question::parse(raw)?;
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());
        debug!(stage = %Stage::Generating, "Question accepted");

        let descriptor = self.descriptors.generate(&question).await.into_value();
        let label = table_label(descriptor.table.name());
        let rows = self.execute(Artifact::Rest(descriptor)).await?;
        let response = self.format(&self.structured_formatter, &question, &label, &rows).await;

        self.persist(&question, &response).await
    }

    async fn classify(&self, question: &Question) -> Result<(Classification, Option<&SheetRef>)> {
        let Some(ref special) = self.special else {
            return Ok((Classification::General, None));
        };
        debug!(stage = %Stage::Classifying, "Classifying question");
        let label = special.classifier.classify(question).await?.into_value();
        Ok((label, Some(&special.sheet)))
    }

    async fn answer_relational(&self, question: &Question) -> Result<String> {
        let generator = self
            .relational
            .as_ref()
            .ok_or_else(|| QueryError::Config("no reasoning service configured for query generation".into()))?;
        debug!(stage = %Stage::Generating, "Generating query");

        match generator.generate(question).await? {
            RelationalOutcome::Query(query) => {
                let rows = self.execute(Artifact::SqlText(query)).await?;
                Ok(self.format(&self.formatter, question, DATABASE_LABEL, &rows).await)
            }
            RelationalOutcome::Declined { reply, .. } => Ok(reply),
            RelationalOutcome::Verbatim(text) => Ok(text),
        }
    }

    async fn execute(&self, artifact: Artifact) -> Result<ResultRows> {
        debug!(stage = %Stage::Executing, kind = artifact.kind(), "Executing artifact");
        tokio::time::timeout(self.stage_timeout, self.executor.execute(&artifact))
            .await
            .map_err(|_| QueryError::Timeout(Stage::Executing))?
    }

    async fn format(&self, formatter: &Formatter, question: &Question, label: &str, rows: &ResultRows) -> String {
        debug!(stage = %Stage::Formatting, rows = rows.len(), "Formatting rows");
        formatter.format(question, label, rows).await.into_value()
    }

    async fn persist(&self, question: &Question, response: &str) -> Result<QueryRecord> {
        let record = self.store.create(question.as_str(), response).await?;
        debug!(stage = %Stage::Persisted, id = %record.id, "Record stored");
        info!(stage = %Stage::Returned, id = %record.id, "Question answered");
        Ok(record)
    }
}

/// `transactions` -> `Transactions`
fn table_label(table: &str) -> String {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
