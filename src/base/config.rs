//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default Ollama host to relay prompts to.
fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

/// Default Ollama model to invoke.
fn default_ollama_model() -> String {
    "llama3".to_string()
}

/// Default bound on a single generation request, in seconds.
fn default_ollama_timeout_secs() -> u64 {
    60
}

/// Default bind address for the liveness endpoint.
fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

/// Default port for the liveness endpoint.
fn default_health_port() -> u16 {
    5001
}

/// Default reaction used to show that a reply is on its way.
fn default_pending_reaction() -> String {
    "hourglass_flowing_sand".to_string()
}

/// Configuration for the relay-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token, used for the socket mode connection (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Base URL of the Ollama server (`OLLAMA_HOST`).
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    /// Model to generate with (`OLLAMA_MODEL`).
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    /// Timeout for a single generation request, in seconds (`OLLAMA_TIMEOUT_SECS`).
    #[serde(default = "default_ollama_timeout_secs")]
    pub ollama_timeout_secs: u64,
    /// Bind address of the liveness endpoint (`HEALTH_HOST`).
    #[serde(default = "default_health_host")]
    pub health_host: String,
    /// Port of the liveness endpoint (`HEALTH_PORT`).
    #[serde(default = "default_health_port")]
    pub health_port: u16,
    /// Emoji name added to a message while its reply is generated (`PENDING_REACTION`).
    #[serde(default = "default_pending_reaction")]
    pub pending_reaction: String,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default());

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check the values that deserialization alone cannot.
    pub fn validate(&self) -> Res<()> {
        if self.slack_app_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack app token must be set (`SLACK_APP_TOKEN`)."));
        }

        if self.slack_bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack bot token must be set (`SLACK_BOT_TOKEN`)."));
        }

        let host = reqwest::Url::parse(&self.ollama_host).map_err(|e| anyhow::anyhow!("Ollama host `{}` is not a valid URL: {e}", self.ollama_host))?;
        if host.scheme() != "http" && host.scheme() != "https" {
            return Err(anyhow::anyhow!("Ollama host must be an http or https URL."));
        }

        if self.ollama_model.trim().is_empty() {
            return Err(anyhow::anyhow!("Ollama model must not be empty."));
        }

        if self.ollama_timeout_secs < 1 {
            return Err(anyhow::anyhow!("Ollama timeout must be at least 1 second."));
        }

        Ok(())
    }

    /// The Ollama host without any trailing slash.
    pub fn ollama_base_url(&self) -> &str {
        self.ollama_host.trim_end_matches('/')
    }

    /// The address the liveness endpoint binds to.
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.health_host, self.health_port)
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn valid_inner() -> ConfigInner {
        ConfigInner {
            slack_app_token: "xapp-test".to_string(),
            slack_bot_token: "xoxb-test".to_string(),
            ollama_host: default_ollama_host(),
            ollama_model: default_ollama_model(),
            ollama_timeout_secs: default_ollama_timeout_secs(),
            health_host: default_health_host(),
            health_port: default_health_port(),
            pending_reaction: default_pending_reaction(),
        }
    }

    fn write_temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("relay-bot-{}-{name}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_apply_to_missing_keys() {
        let path = write_temp_config("defaults", "slack_app_token = \"xapp-file\"\nslack_bot_token = \"xoxb-file\"\n");

        // File only, so exported `OLLAMA_*` variables cannot leak in.
        let inner: ConfigInner = config::Config::builder().add_source(config::File::from(path.clone())).build().unwrap().try_deserialize().unwrap();
        let config = Config::from(inner);

        assert_eq!(config.slack_app_token, "xapp-file");
        assert_eq!(config.slack_bot_token, "xoxb-file");
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(config.ollama_model, "llama3");
        assert_eq!(config.ollama_timeout_secs, 60);
        assert_eq!(config.health_port, 5001);
        assert_eq!(config.health_addr(), "0.0.0.0:5001");
        assert_eq!(config.pending_reaction, "hourglass_flowing_sand");
        assert!(config.validate().is_ok());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_prefers_file_values() {
        let path = write_temp_config(
            "file",
            "slack_app_token = \"xapp-file\"\nslack_bot_token = \"xoxb-file\"\nollama_host = \"http://localhost:11434\"\nollama_model = \"llama3\"\n",
        );

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.slack_app_token, "xapp-file");
        assert_eq!(config.slack_bot_token, "xoxb-file");
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(config.ollama_model, "llama3");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_reads_overrides() {
        let path = write_temp_config(
            "overrides",
            "slack_app_token = \"xapp-file\"\nslack_bot_token = \"xoxb-file\"\nollama_host = \"http://gpu-box:11434/\"\nollama_model = \"mistral\"\nollama_timeout_secs = 5\n",
        );

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.ollama_model, "mistral");
        assert_eq!(config.ollama_timeout_secs, 5);
        assert_eq!(config.ollama_base_url(), "http://gpu-box:11434");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::from(valid_inner()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut inner = valid_inner();
        inner.slack_bot_token = "".to_string();
        assert!(Config::from(inner).validate().is_err());

        let mut inner = valid_inner();
        inner.slack_app_token = "   ".to_string();
        assert!(Config::from(inner).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let mut inner = valid_inner();
        inner.ollama_host = "not a url".to_string();
        assert!(Config::from(inner).validate().is_err());

        let mut inner = valid_inner();
        inner.ollama_host = "ftp://localhost:11434".to_string();
        assert!(Config::from(inner).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_empty_model() {
        let mut inner = valid_inner();
        inner.ollama_timeout_secs = 0;
        assert!(Config::from(inner).validate().is_err());

        let mut inner = valid_inner();
        inner.ollama_model = "".to_string();
        assert!(Config::from(inner).validate().is_err());
    }
}
