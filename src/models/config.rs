//! Configuration models for credforge.
//!
//! Everything an operator can tune lives here, resolved once at startup
//! from a TOML file. Field defaults match the study's reference settings
//! so a minimal config only needs an API key.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for credforge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenRouter API configuration
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Generation settings (model, batch sizing, sectors, policy toggles)
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Output artifact paths
    #[serde(default)]
    pub output: OutputConfig,
}

/// OpenRouter API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API key (can also be set via the api_key_env variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL for OpenRouter API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries per request on transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_timeout() -> u64 {
    180
}

fn default_max_retries() -> u32 {
    3
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model ID (e.g., "google/gemini-2.0-flash-001")
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. High on purpose: batch variety matters more
    /// than coherence for persona generation.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum completion tokens per batch request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Target corpus size
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Personas requested per service call
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Sector labels rotated across batches
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,

    /// Reject work passwords found on the known-weak blocklist
    #[serde(default = "default_true")]
    pub blocklist_enabled: bool,

    /// Fixed sleep after a failed or unparseable batch, in seconds
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
}

fn default_model() -> String {
    "google/gemini-2.0-flash-001".to_string()
}

fn default_temperature() -> f64 {
    1.4
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_target_count() -> usize {
    2500
}

fn default_chunk_size() -> usize {
    15
}

fn default_sectors() -> Vec<String> {
    [
        "Banking",
        "Healthcare",
        "Construction",
        "Education",
        "Retail",
        "Tech",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_backoff() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            target_count: default_target_count(),
            chunk_size: default_chunk_size(),
            sectors: default_sectors(),
            blocklist_enabled: default_true(),
            backoff_secs: default_backoff(),
        }
    }
}

/// Output artifact paths and export shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Durable corpus snapshot (JSON array of persona records)
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Append-only credential export (CSV, two rows per record)
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,

    /// Human-readable summary, rewritten each batch
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,

    /// Include sector and behavior columns in the credential export
    #[serde(default)]
    pub extended_export: bool,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("personas.json")
}

fn default_export_path() -> PathBuf {
    PathBuf::from("credentials.csv")
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("data_summary.txt")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            export_path: default_export_path(),
            summary_path: default_summary_path(),
            extended_export: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Resolve the OpenRouter API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.openrouter.api_key {
            return Ok(key.clone());
        }

        std::env::var(&self.openrouter.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env_var: self.openrouter.api_key_env.clone(),
        })
    }

    /// Validate settings that serde defaults cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.sectors.is_empty() {
            return Err(ConfigError::Invalid(
                "generation.sectors must not be empty".to_string(),
            ));
        }
        if self.generation.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "generation.chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key: set {env_var} env var or api_key in config")]
    MissingApiKey { env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.generation.target_count, 2500);
        assert_eq!(config.generation.chunk_size, 15);
        assert_eq!(config.generation.sectors.len(), 6);
        assert!(config.generation.blocklist_enabled);
        assert_eq!(config.output.snapshot_path, PathBuf::from("personas.json"));
        assert!(!config.output.extended_export);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            r#"
            [generation]
            target_count = 10
            sectors = ["Banking"]

            [output]
            extended_export = true
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.target_count, 10);
        assert_eq!(config.generation.sectors, vec!["Banking".to_string()]);
        assert!(config.output.extended_export);
        // untouched sections keep defaults
        assert_eq!(config.openrouter.timeout_secs, 180);
    }

    #[test]
    fn test_validate_rejects_empty_sectors() {
        let mut config = Config {
            openrouter: OpenRouterConfig::default(),
            generation: GenerationConfig::default(),
            output: OutputConfig::default(),
        };
        config.generation.sectors.clear();
        assert!(config.validate().is_err());
    }
}
