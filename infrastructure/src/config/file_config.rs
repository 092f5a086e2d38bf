//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use council_domain::{DEFAULT_CHAIRMAN_MODEL, DEFAULT_COUNCIL_MODELS, OutputFormat, Settings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// Re-export OutputFormat from domain for convenience
pub use council_domain::OutputFormat as FileOutputFormat;

/// Default backend address
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Default lifetime of the cached model catalog
pub const DEFAULT_CATALOG_TTL_SECONDS: u64 = 600;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("catalog.cache_ttl_seconds cannot be 0")]
    InvalidCacheTtl,

    #[error("model name cannot be empty")]
    EmptyModelName,
}

/// Raw backend configuration from TOML (`[backend]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the council backend
    pub base_url: String,
    /// Timeout in seconds for non-streaming requests
    pub timeout_seconds: Option<u64>,
    /// Longest silence tolerated between two stream events
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_seconds: None,
            idle_timeout_seconds: None,
        }
    }
}

impl FileBackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_seconds.map(Duration::from_secs)
    }
}

/// Raw council configuration from TOML (`[council]`)
///
/// Used as the local settings when the backend has none to offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Council member model ids
    pub models: Vec<String>,
    /// Chairman model id
    pub chairman: String,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_COUNCIL_MODELS.iter().map(|m| m.to_string()).collect(),
            chairman: DEFAULT_CHAIRMAN_MODEL.to_string(),
        }
    }
}

impl FileCouncilConfig {
    pub fn to_settings(&self) -> Settings {
        Settings::new(self.models.clone(), self.chairman.clone()).or_defaults()
    }
}

/// Raw behavior configuration from TOML (`[behavior]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBehaviorConfig {
    /// Reject a message while a turn is in flight on the same conversation
    pub serialize_turns: bool,
    /// Remove the optimistic pair when the stream fails
    pub rollback_on_transport_failure: bool,
}

impl Default for FileBehaviorConfig {
    fn default() -> Self {
        Self {
            serialize_turns: true,
            rollback_on_transport_failure: true,
        }
    }
}

/// Raw output configuration from TOML (`[output]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format (uses domain type)
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Raw REPL configuration from TOML (`[repl]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show progress indicators
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

/// Raw logging configuration from TOML (`[logging]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily-rolling diagnostic logs
    pub dir: Option<PathBuf>,
    /// JSONL turn transcript path
    pub transcript: Option<PathBuf>,
}

/// Raw model catalog configuration from TOML (`[catalog]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    /// Seconds a fetched catalog stays fresh
    pub cache_ttl_seconds: u64,
    /// Where the last good catalog is kept for offline use
    pub snapshot_path: Option<PathBuf>,
}

impl Default for FileCatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CATALOG_TTL_SECONDS,
            snapshot_path: None,
        }
    }
}

impl FileCatalogConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend: FileBackendConfig,
    pub council: FileCouncilConfig,
    pub behavior: FileBehaviorConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
    pub logging: FileLoggingConfig,
    pub catalog: FileCatalogConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        if self.backend.timeout_seconds == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout("backend.timeout_seconds"));
        }
        if self.backend.idle_timeout_seconds == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout(
                "backend.idle_timeout_seconds",
            ));
        }
        if self.catalog.cache_ttl_seconds == 0 {
            return Err(ConfigValidationError::InvalidCacheTtl);
        }
        if self.council.models.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyModelName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[backend]
base_url = "http://council.internal:9000"
timeout_seconds = 30
idle_timeout_seconds = 300

[council]
models = ["openai/gpt-5.1", "x-ai/grok-4"]
chairman = "x-ai/grok-4"

[behavior]
serialize_turns = false

[output]
format = "full"
color = false

[repl]
show_progress = false
history_file = "~/.local/share/llm-council/history.txt"

[logging]
dir = "/tmp/llm-council/logs"
transcript = "/tmp/llm-council/turns.jsonl"

[catalog]
cache_ttl_seconds = 60
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "http://council.internal:9000");
        assert_eq!(config.backend.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.council.models.len(), 2);
        assert_eq!(config.council.chairman, "x-ai/grok-4");
        assert!(!config.behavior.serialize_turns);
        assert!(config.behavior.rollback_on_transport_failure);
        assert_eq!(config.output.format, Some(OutputFormat::Full));
        assert!(!config.output.color);
        assert!(!config.repl.show_progress);
        assert_eq!(
            config.logging.transcript,
            Some(PathBuf::from("/tmp/llm-council/turns.jsonl"))
        );
        assert_eq!(config.catalog.cache_ttl(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[council]
chairman = "anthropic/claude-sonnet-4.5"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.council.chairman, "anthropic/claude-sonnet-4.5");
        // Defaults should apply
        assert_eq!(config.council.models.len(), DEFAULT_COUNCIL_MODELS.len());
        assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.catalog.cache_ttl_seconds, DEFAULT_CATALOG_TTL_SECONDS);
        assert!(config.output.color);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.behavior.serialize_turns);
        assert!(config.backend.timeout().is_none());
        assert!(config.logging.dir.is_none());
        assert_eq!(config.council.to_settings(), Settings::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = FileConfig::default();
        config.backend.timeout_seconds = Some(0);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout("backend.timeout_seconds"))
        );

        let mut config = FileConfig::default();
        config.catalog.cache_ttl_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidCacheTtl));
    }

    #[test]
    fn test_validate_rejects_blank_model() {
        let mut config = FileConfig::default();
        config.council.models.push("  ".to_string());
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyModelName));
    }

    #[test]
    fn test_empty_council_falls_back_to_defaults() {
        let config: FileConfig = toml::from_str("[council]\nmodels = []\nchairman = \"\"\n").unwrap();
        assert_eq!(config.council.to_settings(), Settings::default());
    }
}
