// src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::time::Duration;
use tracing::{debug, info, warn};

use super::file::FileConfig;

/// Default REST row bound when a descriptor carries no limit
pub const DEFAULT_REST_LIMIT: u32 = 50;
/// Default per-stage time budget
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 90;
/// Public sheet export host
pub const DEFAULT_SHEET_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Which query-record store backs the Persister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    Memory,
    #[default]
    Sqlite,
}

impl StoreKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => Some(Self::Memory),
            "sqlite" | "sql" | "database" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// API keys loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Chat-completions key (OPENAI_API_KEY)
    pub openai: Option<String>,
    /// REST data endpoint credential (QG_REST_API_KEY)
    pub rest: Option<String>,
}

impl ApiKeys {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            openai: read_non_empty(lookup, "OPENAI_API_KEY"),
            rest: read_non_empty(lookup, "QG_REST_API_KEY"),
        }
    }

    /// Get a summary of available credentials (without exposing values)
    pub fn summary(&self) -> String {
        let mut present = Vec::new();
        if self.openai.is_some() {
            present.push("OpenAI");
        }
        if self.rest.is_some() {
            present.push("REST");
        }
        if present.is_empty() {
            "None".to_string()
        } else {
            present.join(", ")
        }
    }
}

/// Server bind settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Reasoning service endpoints
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// Workflow webhook used for classification, SQL generation and narratives
    pub webhook_url: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Retries of transient (429/5xx/connect) failures per reasoning call
    pub max_retries: u32,
}

/// REST data endpoint
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: Option<String>,
    pub default_limit: u32,
}

/// The special-cased tabular source
#[derive(Debug, Clone)]
pub struct SpecialSourceConfig {
    /// Display name used in prompts and the fallback header, e.g. "Netflix Stock"
    pub name: String,
    pub sheet_id: String,
}

/// Relational backend settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub database_url: String,
    /// Database the generated SQL runs against (defaults to `database_url`,
    /// opened read-only)
    pub analytics_database_url: Option<String>,
    pub sql_read_only: bool,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub api_keys: ApiKeys,
    pub reasoning: ReasoningConfig,
    pub rest: RestConfig,
    pub special_source: Option<SpecialSourceConfig>,
    pub sheet_base_url: String,
    pub stage_timeout: Duration,
    pub log_level: String,
}

impl AppConfig {
    /// Load all configuration (call once at startup, after dotenvy)
    pub fn load() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        let path = FileConfig::config_path(lookup("QG_CONFIG"));
        let file = FileConfig::load(&path);
        let config = Self::from_sources(file, lookup);
        info!(
            store = ?config.store.kind,
            credentials = %config.api_keys.summary(),
            special_source = config.special_source.is_some(),
            "Loaded configuration"
        );
        config
    }

    /// Merge file values with an environment lookup; the environment wins
    pub fn from_sources(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| read_non_empty(&lookup, key);

        let server = ServerConfig {
            host: env("QG_HOST")
                .or(file.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env(&lookup, "QG_PORT")
                .or(file.server.port)
                .unwrap_or(5000),
        };

        let store_kind = env("QG_STORE")
            .or(file.store.backend)
            .and_then(|s| {
                let parsed = StoreKind::parse(&s);
                if parsed.is_none() {
                    warn!(value = %s, "Unknown store backend, using sqlite");
                }
                parsed
            })
            .unwrap_or_default();

        let store = StoreConfig {
            kind: store_kind,
            database_url: env("DATABASE_URL")
                .or(file.store.database_url)
                .unwrap_or_else(|| "sqlite:querygenius.db?mode=rwc".to_string()),
            analytics_database_url: env("QG_ANALYTICS_DATABASE_URL")
                .or(file.store.analytics_database_url),
            sql_read_only: parse_bool_env(&lookup, "QG_SQL_READ_ONLY")
                .or(file.store.sql_read_only)
                .unwrap_or(false),
        };

        let reasoning = ReasoningConfig {
            webhook_url: env("QG_WEBHOOK_URL").or(file.reasoning.webhook_url),
            openai_base_url: env("OPENAI_BASE_URL")
                .or(file.reasoning.openai_base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: env("QG_OPENAI_MODEL")
                .or(file.reasoning.openai_model)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            max_retries: parse_env(&lookup, "QG_LLM_MAX_RETRIES")
                .or(file.reasoning.max_retries)
                .unwrap_or(0),
        };

        let rest = RestConfig {
            base_url: env("QG_REST_BASE_URL").or(file.rest.base_url),
            default_limit: file.rest.default_limit.unwrap_or(DEFAULT_REST_LIMIT),
        };

        let special_source = env("QG_SPECIAL_SHEET_ID")
            .or(file.special_source.sheet_id)
            .map(|sheet_id| SpecialSourceConfig {
                name: env("QG_SPECIAL_SOURCE_NAME")
                    .or(file.special_source.name)
                    .unwrap_or_else(|| "Netflix Stock".to_string()),
                sheet_id,
            });

        let sheet_base_url = env("QG_SHEET_BASE_URL")
            .or(file.special_source.sheet_base_url)
            .unwrap_or_else(|| DEFAULT_SHEET_BASE_URL.to_string());

        let stage_timeout = Duration::from_secs(
            parse_env(&lookup, "QG_STAGE_TIMEOUT_SECS")
                .or(file.pipeline.stage_timeout_secs)
                .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS),
        );

        let log_level = env("QG_LOG_LEVEL")
            .or(file.server.log_level)
            .unwrap_or_else(|| "info".to_string());

        Self {
            server,
            store,
            api_keys: ApiKeys::from_lookup(&lookup),
            reasoning,
            rest,
            special_source,
            sheet_base_url,
            stage_timeout,
            log_level,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.reasoning.webhook_url.is_none() {
            validation.add_warning(
                "QG_WEBHOOK_URL not set. POST /api/queries will fail at classification/generation.",
            );
        }
        if self.api_keys.openai.is_none() {
            validation.add_warning(
                "OPENAI_API_KEY not set. Structured queries will use heuristic descriptors and plain rendering.",
            );
        }
        if self.rest.base_url.is_none() {
            validation.add_warning("QG_REST_BASE_URL not set. Structured queries cannot execute.");
        } else if self.api_keys.rest.is_none() {
            validation.add_warning("QG_REST_API_KEY not set. REST fetches will be rejected.");
        }
        if self.stage_timeout.is_zero() {
            validation.add_error("QG_STAGE_TIMEOUT_SECS must be greater than zero");
        }
        if self.rest.default_limit == 0 {
            validation.add_error("rest.default_limit must be greater than zero");
        }
        if let Some(ref special) = self.special_source {
            if special.name.trim().is_empty() {
                validation.add_error("special source name must not be empty");
            }
        }

        debug!(
            warnings = validation.warnings.len(),
            errors = validation.errors.len(),
            "Configuration validated"
        );
        validation
    }

    /// Database the relational source executes against, and whether it is
    /// opened read-only. The store's own database is never writable from
    /// generated SQL.
    pub fn analytics_source(&self) -> (&str, bool) {
        match self.store.analytics_database_url.as_deref() {
            Some(url) if url != self.store.database_url => (url, self.store.sql_read_only),
            _ => (&self.store.database_url, true),
        }
    }
}

/// Configuration validation result
#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ConfigValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

fn read_non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = read_non_empty(lookup, name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key = name, value = %raw, "Unparsable value, ignoring");
            None
        }
    }
}

fn parse_bool_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let value = read_non_empty(lookup, name)?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
