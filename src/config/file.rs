// src/config/file.rs
// File-based configuration from querygenius.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "querygenius.toml";

/// Top-level config structure. Every value is optional; environment
/// variables take precedence over anything set here.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub reasoning: ReasoningSection,
    #[serde(default)]
    pub rest: RestSection,
    #[serde(default)]
    pub special_source: SpecialSourceSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreSection {
    /// "memory" or "sqlite"
    pub backend: Option<String>,
    pub database_url: Option<String>,
    pub analytics_database_url: Option<String>,
    pub sql_read_only: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReasoningSection {
    pub webhook_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RestSection {
    pub base_url: Option<String>,
    pub default_limit: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SpecialSourceSection {
    pub name: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PipelineSection {
    pub stage_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load config from `path`, falling back to defaults when the file is
    /// missing or unparsable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the config file path (QG_CONFIG overrides the default)
    pub fn config_path(explicit: Option<String>) -> PathBuf {
        explicit
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 8081

[store]
backend = "sqlite"

[special_source]
name = "Netflix Stock"
sheet_id = "abc-123_XY"
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, Some(8081));
        assert_eq!(config.store.backend.as_deref(), Some("sqlite"));
        assert_eq!(config.special_source.sheet_id.as_deref(), Some("abc-123_XY"));
        assert!(config.reasoning.webhook_url.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.server.host.is_none());
        assert!(config.pipeline.stage_timeout_secs.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = FileConfig::load(Path::new("/nonexistent/querygenius.toml"));
        assert!(config.store.backend.is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nstage_timeout_secs = 7").unwrap();
        let config = FileConfig::load(file.path());
        assert_eq!(config.pipeline.stage_timeout_secs, Some(7));
    }

    #[test]
    fn test_load_garbage_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();
        let config = FileConfig::load(file.path());
        assert!(config.server.port.is_none());
    }

    #[test]
    fn test_config_path_override() {
        assert_eq!(
            FileConfig::config_path(Some("/etc/qg.toml".into())),
            PathBuf::from("/etc/qg.toml")
        );
        assert_eq!(FileConfig::config_path(None), PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(
            FileConfig::config_path(Some("  ".into())),
            PathBuf::from(DEFAULT_CONFIG_FILE)
        );
    }
}
