use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `model.artifact_path`
pub const MODEL_PATH_ENV: &str = "LOGLENS_MODEL_PATH";
/// Environment variable overriding `telemetry.database_path`
pub const DATABASE_ENV: &str = "LOGLENS_DATABASE";

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for the loglens service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model artifact configuration
    pub model: ModelConfig,
    /// Telemetry storage configuration
    pub telemetry: TelemetryConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON model artifact
    pub artifact_path: PathBuf,
    /// Load the artifact at startup instead of on first use
    #[serde(default)]
    pub preload: bool,
}

/// Telemetry storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Path to the SQLite database
    pub database_path: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path; stdout when absent
    pub file_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                artifact_path: PathBuf::from("models/log_anomaly_model.json"),
                preload: true,
            },
            telemetry: TelemetryConfig {
                database_path: PathBuf::from("loglens.db"),
            },
            output: OutputConfig {
                format: "console".to_string(),
                file_path: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `LOGLENS_MODEL_PATH` and `LOGLENS_DATABASE` if set
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|v| !v.is_empty()) {
            self.model.artifact_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(DATABASE_ENV).filter(|v| !v.is_empty()) {
            self.telemetry.database_path = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loglens.toml");

        let config = Config::default();
        config.to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_preload_defaults_to_false() {
        let config: Config = toml::from_str(
            r#"
            [model]
            artifact_path = "m.json"

            [telemetry]
            database_path = "t.db"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert!(!config.model.preload);
        assert!(config.output.file_path.is_none());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[model\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            MODEL_PATH_ENV => Some("/opt/model.json".to_string()),
            DATABASE_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.model.artifact_path, PathBuf::from("/opt/model.json"));
        assert_eq!(config.telemetry.database_path, PathBuf::from("loglens.db"));
    }
}
