//! TOML file configuration structures.
//!
//! These structs directly map to the `streamwatch.toml` file format.

use serde::Deserialize;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub youtube: YoutubeConfig,
    pub telegram: TelegramConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Host name the hub can reach this service on. Enables push mode.
    #[serde(default)]
    pub public_host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            public_host: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key.
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot API root, for self-hosted API servers.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// e.g. `redis://127.0.0.1:6379`
    pub url: String,
}

/// `[engine]` tunables. Everything is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub poll_delay_secs: u64,
    pub feed_error_backoff_secs: u64,
    pub feed_empty_backoff_secs: u64,
    pub lease_min_cycle_secs: u64,
    pub lease_margin_secs: u64,
    pub lock_ttl_secs: u64,
    pub lock_retries: u32,
    pub lock_retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub store_timeout_secs: u64,
    pub fanout_concurrency: usize,
    pub timezone_tip_chance: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            poll_delay_secs: 60,
            feed_error_backoff_secs: 10,
            feed_empty_backoff_secs: 60,
            lease_min_cycle_secs: 60,
            lease_margin_secs: 300,
            lock_ttl_secs: 300,
            lock_retries: 8,
            lock_retry_delay_ms: 250,
            request_timeout_secs: 5,
            store_timeout_secs: 60,
            fanout_concurrency: 8,
            timezone_tip_chance: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parsing() {
        let toml_str = r#"
[youtube]
api_key = "yt-key"

[telegram]
bot_token = "123:abc"

[redis]
url = "redis://127.0.0.1:6379"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert!(config.server.public_host.is_none());
        assert_eq!(config.engine, EngineSection::default());
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
public_host = "bot.example.com"

[youtube]
api_key = "yt-key"

[telegram]
bot_token = "123:abc"
api_base = "http://localhost:8081/"

[redis]
url = "redis://127.0.0.1:6379"

[engine]
poll_delay_secs = 30
lock_retries = 3
timezone_tip_chance = 0.0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.server.public_host.as_deref(), Some("bot.example.com"));
        assert_eq!(config.telegram.api_base.as_deref(), Some("http://localhost:8081/"));
        assert_eq!(config.engine.poll_delay_secs, 30);
        assert_eq!(config.engine.lock_retries, 3);
        assert_eq!(config.engine.lease_margin_secs, 300);
        assert_eq!(config.engine.timezone_tip_chance, 0.0);
    }

    #[test]
    fn test_missing_section_rejected() {
        let toml_str = r#"
[youtube]
api_key = "yt-key"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
