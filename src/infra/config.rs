// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::ResearchError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// OpenAI-compatible endpoint; the public OpenAI API when unset.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-2024-04-09".into(),
            temperature: 0.2,
            max_tokens: 2000,
            base_url: None,
            api_key_env: "OPENAI_API_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_iterations: u8,
    pub completeness_threshold: f32,
    pub deadline_seconds: Option<u64>,
    pub revise_on_final_iteration: bool,
    /// Rows of the dataset shown to the model alongside the column profile.
    pub sample_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            completeness_threshold: 0.85,
            deadline_seconds: None,
            revise_on_final_iteration: false,
            sample_rows: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay_ms: 2_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ResearchError> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ResearchError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ResearchError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.analysis.max_iterations, 8);
        assert!((c.analysis.completeness_threshold - 0.85).abs() < 0.001);
        assert!(c.analysis.deadline_seconds.is_none());
        assert_eq!(c.model.model, "gpt-4-turbo-2024-04-09");
        assert!((c.model.temperature - 0.2).abs() < 0.001);
        assert_eq!(c.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(c.retry.max_retries, 4);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.max_iterations, 8);
        assert_eq!(config.analysis.sample_rows, 5);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml_str = r#"
[analysis]
max_iterations = 3
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analysis.max_iterations, 3);
        assert!((config.analysis.completeness_threshold - 0.85).abs() < 0.001);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[model]
model = "gpt-4.1-mini"
temperature = 0.0
max_tokens = 1000
base_url = "http://localhost:11434/v1"
api_key_env = "LOCAL_KEY"

[analysis]
max_iterations = 5
completeness_threshold = 0.9
deadline_seconds = 600
revise_on_final_iteration = true
sample_rows = 10

[retry]
max_retries = 2
initial_delay_ms = 500
backoff_factor = 3.0
max_delay_ms = 10000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.model, "gpt-4.1-mini");
        assert_eq!(
            config.model.base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        assert_eq!(config.model.api_key_env, "LOCAL_KEY");
        assert_eq!(config.analysis.max_iterations, 5);
        assert_eq!(config.analysis.deadline_seconds, Some(600));
        assert!(config.analysis.revise_on_final_iteration);
        assert_eq!(config.analysis.sample_rows, 10);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.max_delay_ms, 10_000);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.analysis.max_iterations,
            config.analysis.max_iterations
        );
        assert_eq!(deserialized.model.model, config.model.model);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\ncompleteness_threshold = 0.7").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert!((config.analysis.completeness_threshold - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis\nmax_iterations = ").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ResearchError::Io(_))));
    }
}
