use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::DEFAULT_ENGINE_PROGRAM;
use crate::model::download::{DEFAULT_MAX_REDIRECTS, MODEL_BASE_URL};
use crate::model::DEFAULT_MODEL_NAME;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "WHISPER_BATCH_CONFIG";

const DEFAULT_CONFIG: &str = r#"[engine]
program = "whisper-cli"

[model]
dir = "~/.whisper-batch/models"
name = "ggml-medium.bin"
base_url = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main"
max_redirects = 5

[telemetry]
enabled = false
log_path = "~/.whisper-batch/whisper-batch.log"
"#;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub model: ModelConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Transcription binary, looked up on `PATH` unless it is a path
    pub program: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding downloaded models
    pub dir: String,
    /// Model file used when `--model` is not given
    pub name: String,
    /// Host the models are fetched from
    pub base_url: String,
    /// Longest redirect chain followed while downloading
    pub max_redirects: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub log_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_ENGINE_PROGRAM.to_owned(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: "~/.whisper-batch/models".to_owned(),
            name: DEFAULT_MODEL_NAME.to_owned(),
            base_url: MODEL_BASE_URL.to_owned(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: "~/.whisper-batch/whisper-batch.log".to_owned(),
        }
    }
}

impl ModelConfig {
    /// Default model path, `dir` joined with `name`
    ///
    /// # Errors
    /// Returns error if `dir` starts with `~/` and HOME is not set
    pub fn default_model_path(&self) -> Result<PathBuf> {
        Ok(Config::expand_path(&self.dir)?.join(&self.name))
    }
}

impl Config {
    /// Load config from `$WHISPER_BATCH_CONFIG` or ~/.whisper-batch.toml
    ///
    /// A missing file yields the defaults; nothing is written here.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path()?)
    }

    /// Load config from `path`, falling back to the defaults if it is absent
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        toml::from_str(&contents).context("failed to parse config TOML")
    }

    /// Location of the config file
    ///
    /// # Errors
    /// Returns error if neither `WHISPER_BATCH_CONFIG` nor HOME is set
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let home = std::env::var("HOME")
            .context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".whisper-batch.toml"))
    }

    /// Write the default config to `path` unless a file is already there;
    /// returns whether it was written
    ///
    /// # Errors
    /// Returns error if the file or its directory cannot be created
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        fs::write(path, DEFAULT_CONFIG)
            .context("failed to write default config")?;
        Ok(true)
    }

    /// Expand ~ in paths to home directory
    ///
    /// # Errors
    /// Returns error if the path starts with `~/` and HOME is not set
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(stripped) = path.strip_prefix("~/") {
            let home = std::env::var("HOME")
                .context("HOME environment variable not set")?;
            Ok(PathBuf::from(home).join(stripped))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn create_test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "whisper_batch_config_test_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"[engine]
program = "/opt/whisper.cpp/build/bin/whisper-cli"

[model]
name = "ggml-small.bin"
"#,
        )
        .unwrap();

        assert_eq!(parsed.engine.program, "/opt/whisper.cpp/build/bin/whisper-cli");
        assert_eq!(parsed.model.name, "ggml-small.bin");
        assert_eq!(parsed.model.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(parsed.model.base_url, MODEL_BASE_URL);
        assert!(!parsed.telemetry.enabled);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let dir = create_test_dir();
        let path = dir.join("bad.toml");
        fs::write(&path, "[model\nname = 1").unwrap();

        assert!(Config::load_from(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_default_then_load() {
        let dir = create_test_dir();
        let path = dir.join("nested").join("config.toml");

        assert!(Config::write_default_if_missing(&path).unwrap());
        assert!(!Config::write_default_if_missing(&path).unwrap());
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_loads_defaults_without_writing() {
        let dir = create_test_dir();
        let path = dir.join("absent.toml");

        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
        assert!(!path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = create_test_dir();
        let path = dir.join("config.toml");
        fs::write(&path, "[model]\nname = \"ggml-base.bin\"\n").unwrap();

        assert!(!Config::write_default_if_missing(&path).unwrap());
        assert_eq!(Config::load_or_default(&path).unwrap().model.name, "ggml-base.bin");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_model_path() {
        let config = ModelConfig {
            dir: "/srv/models".to_owned(),
            ..ModelConfig::default()
        };
        assert_eq!(
            config.default_model_path().unwrap(),
            PathBuf::from("/srv/models/ggml-medium.bin")
        );
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let home = std::env::var("HOME").expect("HOME not set");
        let result = Config::expand_path("~/models/ggml-medium.bin").unwrap();
        assert_eq!(result, PathBuf::from(home).join("models/ggml-medium.bin"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let result = Config::expand_path("/var/lib/whisper").unwrap();
        assert_eq!(result, PathBuf::from("/var/lib/whisper"));

        let result = Config::expand_path("models").unwrap();
        assert_eq!(result, PathBuf::from("models"));
    }
}
