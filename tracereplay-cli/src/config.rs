// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracereplay_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REPLAY_URL};
use tracereplay_core::ContextDefaults;
use tracereplay_telemetry::{LogFormat, LoggingConfig};

/// Tracereplay CLI configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Tracing backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub public_key: Option<String>,

    pub secret_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Replay service endpoint (POST)
    #[serde(default = "default_replay_url")]
    pub endpoint: String,

    /// JSON request body template whose `history` gets replaced
    pub template: Option<PathBuf>,

    /// Request timeout in seconds
    #[serde(default = "default_replay_timeout_secs")]
    pub timeout_secs: u64,
}

/// Seeds for rebuilt replay contexts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Model recorded in the context's model config
    #[serde(default = "default_model")]
    pub model: String,

    /// LLM API base URL recorded in the context's model config
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    pub system_prompt: Option<String>,

    #[serde(flatten)]
    pub defaults: ContextDefaults,
}

// Default values
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_replay_url() -> String {
    DEFAULT_REPLAY_URL.to_string()
}

fn default_replay_timeout_secs() -> u64 {
    120
}

fn default_user_id() -> String {
    "tracereplay".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_model_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            public_key: None,
            secret_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_replay_url(),
            template: None,
            timeout_secs: default_replay_timeout_secs(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            model: default_model(),
            base_url: default_model_base_url(),
            system_prompt: None,
            defaults: ContextDefaults::default(),
        }
    }
}

impl BackendConfig {
    pub fn client_config(&self) -> ClientConfig {
        let mut config =
            ClientConfig::new(&self.base_url).with_timeout(Duration::from_secs(self.timeout_secs));
        config.public_key = self.public_key.clone();
        config.secret_key = self.secret_key.clone();
        config
    }
}

impl ReplayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CliConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Load configuration with priority: env > file > defaults. A config
    /// file that was named but does not exist is an error.
    ///
    /// Supported environment variables:
    /// - LANGFUSE_BASE_URL, LANGFUSE_PUBLIC_KEY, LANGFUSE_SECRET_KEY: backend
    /// - TRACEREPLAY_REPLAY_URL: replay endpoint
    /// - TRACEREPLAY_REPLAY_TEMPLATE: request template path
    /// - TRACEREPLAY_LOG_LEVEL, TRACEREPLAY_LOG_FORMAT (`pretty` | `json`)
    /// - TRACEREPLAY_USER_ID: user recorded in rebuilt contexts
    /// - OPENAI_MODEL, OPENAI_BASE_URL: model config recorded in rebuilt contexts
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        config_file: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Runs before logging is installed, so problems are errors, not logs.
        let mut config = match config_file {
            Some(path) if !path.exists() => {
                anyhow::bail!("Config file not found: {:?}", path)
            }
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        // Override with environment variables
        config.merge_with_env(lookup)?;
        Ok(config)
    }

    /// Only variables that are set and non-empty override file values.
    fn merge_with_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(url) = var("LANGFUSE_BASE_URL") {
            self.backend.base_url = url;
        }
        if let Some(key) = var("LANGFUSE_PUBLIC_KEY") {
            self.backend.public_key = Some(key);
        }
        if let Some(key) = var("LANGFUSE_SECRET_KEY") {
            self.backend.secret_key = Some(key);
        }

        if let Some(url) = var("TRACEREPLAY_REPLAY_URL") {
            self.replay.endpoint = url;
        }
        if let Some(path) = var("TRACEREPLAY_REPLAY_TEMPLATE") {
            self.replay.template = Some(PathBuf::from(path));
        }

        if let Some(level) = var("TRACEREPLAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TRACEREPLAY_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "pretty" => self.logging.format = LogFormat::Pretty,
                other => anyhow::bail!(
                    "Unknown TRACEREPLAY_LOG_FORMAT {:?}, expected `pretty` or `json`",
                    other
                ),
            }
        }

        if let Some(user_id) = var("TRACEREPLAY_USER_ID") {
            self.context.user_id = user_id;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.context.model = model;
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.context.base_url = base_url;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.replay.endpoint, "http://localhost:9001/api/v1/replay");
        assert_eq!(config.context.defaults.max_tokens, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "http://192.168.0.55:3000"
public_key = "pk-lf-file"
secret_key = "sk-lf-file"

[replay]
endpoint = "http://replay.internal/api/v1/replay"
template = "request_template.json"

[logging]
level = "debug"
format = "json"

[context]
model = "gpt-4o-mini"
temperature = 0.2
environment = "staging"
"#
        )
        .unwrap();

        let config = CliConfig::load_with(Some(file.path().to_path_buf()), env(&[])).unwrap();
        assert_eq!(config.backend.base_url, "http://192.168.0.55:3000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(
            config.replay.template,
            Some(PathBuf::from("request_template.json"))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.context.model, "gpt-4o-mini");
        assert_eq!(config.context.user_id, "tracereplay");
        assert_eq!(config.context.defaults.temperature, 0.2);
        assert_eq!(config.context.defaults.max_tokens, 2000);
        assert_eq!(config.context.defaults.environment, "staging");

        let client = config.backend.client_config();
        assert_eq!(client.public_key.as_deref(), Some("pk-lf-file"));
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\nbase_url = \"http://from-file:3000\"").unwrap();

        let config = CliConfig::load_with(
            Some(file.path().to_path_buf()),
            env(&[
                ("LANGFUSE_BASE_URL", "http://from-env:3000"),
                ("TRACEREPLAY_LOG_FORMAT", "JSON"),
                ("OPENAI_MODEL", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "http://from-env:3000");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.context.model, "deepseek-chat");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = CliConfig::load_with(Some(path), env(&[])).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unknown_log_format_is_an_error() {
        let result = CliConfig::load_with(None, env(&[("TRACEREPLAY_LOG_FORMAT", "xml")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_no_file_uses_defaults() {
        let config = CliConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nbase_url = 3").unwrap();
        assert!(CliConfig::load_with(Some(file.path().to_path_buf()), env(&[])).is_err());
    }
}
