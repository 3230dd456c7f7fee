//! Configuration module for streamwatch-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{EngineSection, FileConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use streamwatch_core::config::EngineConfig;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    /// `Some` selects push mode.
    pub public_host: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub api_base: Option<Url>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerSettings,
    pub youtube_api_key: String,
    pub telegram: TelegramSettings,
    pub redis_url: String,
    pub engine: EngineConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read, apply CLI overrides, validate.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP). Only the `[engine]`
    /// section is applied to the running process.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    if file_config.youtube.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError("youtube.api_key is empty".to_string()));
    }
    if file_config.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::ValidationError("telegram.bot_token is empty".to_string()));
    }
    if file_config.redis.url.trim().is_empty() {
        return Err(ConfigError::ValidationError("redis.url is empty".to_string()));
    }
    let public_host = match file_config.server.public_host {
        Some(host) if host.trim().is_empty() => {
            return Err(ConfigError::ValidationError("server.public_host is empty".to_string()));
        }
        other => other,
    };
    let api_base = file_config
        .telegram
        .api_base
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| ConfigError::ValidationError(format!("telegram.api_base: {e}")))?;

    Ok(LoadedConfig {
        server: ServerSettings {
            listen: file_config.server.listen,
            public_host,
        },
        youtube_api_key: file_config.youtube.api_key,
        telegram: TelegramSettings {
            bot_token: file_config.telegram.bot_token,
            api_base,
        },
        redis_url: file_config.redis.url,
        engine: engine_config(&file_config.engine)?,
    })
}

fn engine_config(section: &EngineSection) -> Result<EngineConfig, ConfigError> {
    if section.fanout_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "engine.fanout_concurrency must be at least 1".to_string(),
        ));
    }
    if section.lock_retries == 0 {
        return Err(ConfigError::ValidationError(
            "engine.lock_retries must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&section.timezone_tip_chance) {
        return Err(ConfigError::ValidationError(format!(
            "engine.timezone_tip_chance must be within [0, 1], got {}",
            section.timezone_tip_chance
        )));
    }
    for (name, value) in [
        ("lock_ttl_secs", section.lock_ttl_secs),
        ("request_timeout_secs", section.request_timeout_secs),
        ("store_timeout_secs", section.store_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("engine.{name} must be positive")));
        }
    }

    Ok(EngineConfig {
        poll_delay: Duration::from_secs(section.poll_delay_secs),
        feed_error_backoff: Duration::from_secs(section.feed_error_backoff_secs),
        feed_empty_backoff: Duration::from_secs(section.feed_empty_backoff_secs),
        lease_min_cycle: Duration::from_secs(section.lease_min_cycle_secs),
        lease_margin: Duration::from_secs(section.lease_margin_secs),
        lock_ttl: Duration::from_secs(section.lock_ttl_secs),
        lock_retries: section.lock_retries,
        lock_retry_delay: Duration::from_millis(section.lock_retry_delay_ms),
        request_timeout: Duration::from_secs(section.request_timeout_secs),
        store_timeout: Duration::from_secs(section.store_timeout_secs),
        fanout_concurrency: section.fanout_concurrency,
        timezone_tip_chance: section.timezone_tip_chance,
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<LoadedConfig, ConfigError> {
        build_loaded_config(toml::from_str(toml_str).unwrap())
    }

    const BASE: &str = r#"
[youtube]
api_key = "yt-key"

[telegram]
bot_token = "123:abc"

[redis]
url = "redis://127.0.0.1:6379"
"#;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let loaded = parse(BASE).unwrap();
        assert_eq!(loaded.engine, EngineConfig::default());
        assert!(loaded.server.public_host.is_none());
        assert!(loaded.telegram.api_base.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let toml_str = format!("{BASE}\n[engine]\nfanout_concurrency = 0\n");
        assert!(matches!(parse(&toml_str), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_tip_chance_out_of_range_rejected() {
        let toml_str = format!("{BASE}\n[engine]\ntimezone_tip_chance = 1.5\n");
        assert!(matches!(parse(&toml_str), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let toml_str = BASE.replace("yt-key", " ");
        assert!(matches!(parse(&toml_str), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_bad_api_base_rejected() {
        let toml_str = BASE.replace(
            "bot_token = \"123:abc\"",
            "bot_token = \"123:abc\"\napi_base = \"not a url\"",
        );
        assert!(matches!(parse(&toml_str), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_listen_override() {
        let dir = std::env::temp_dir().join(format!("streamwatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("streamwatch.toml");
        std::fs::write(&path, BASE).unwrap();

        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(listen)).load().unwrap();
        assert_eq!(loaded.server.listen, listen);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
