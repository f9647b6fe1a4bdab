//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::FeedSettings;
use crate::gateway::{GatewaySettings, Provider, QueryOptions};

/// Environment variable that overrides `api_key` from the file.
pub const API_KEY_ENV: &str = "NEWSDESK_API_KEY";

const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every key is optional. The API key is masked in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// News provider: `gnews` or `newsapi`.
    pub provider: Provider,

    /// Provider API key. `NEWSDESK_API_KEY` takes precedence.
    pub api_key: Option<String>,

    /// Override for the provider endpoint. Must be HTTPS except on localhost.
    pub base_url: Option<String>,

    /// Two-letter language code sent with every request.
    pub language: String,

    /// Two-letter country code (used by providers that filter headlines by country).
    pub country: String,

    /// Articles per request. There is no pagination.
    pub page_size: u32,

    /// How long a category stays cached, in seconds.
    pub cache_ttl_secs: u64,

    /// Minimum gap between outbound requests, in milliseconds.
    pub min_request_interval_ms: u64,

    /// Per-request timeout in seconds. 0 = no timeout.
    pub request_timeout_secs: u64,

    /// Category shown at startup and after clearing a search.
    pub default_category: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            base_url: None,
            language: "en".to_string(),
            country: "us".to_string(),
            page_size: 10,
            cache_ttl_secs: 300,
            min_request_interval_ms: 250,
            request_timeout_secs: 0,
            default_category: "general".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("country", &self.country)
            .field("page_size", &self.page_size)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("min_request_interval_ms", &self.min_request_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("default_category", &self.default_category)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "provider",
        "api_key",
        "base_url",
        "language",
        "country",
        "page_size",
        "cache_ttl_secs",
        "min_request_interval_ms",
        "request_timeout_secs",
        "default_category",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(path = %path.display(), provider = %config.provider, "Loaded configuration");
        Ok(config)
    }

    /// The API key to use: the environment value if set and non-blank, else the file's.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Option<SecretString> {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|v| !v.trim().is_empty()))
            .map(|v| SecretString::from(v.trim().to_string()))
    }

    pub fn gateway_settings(&self, api_key: Option<SecretString>) -> GatewaySettings {
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        if page_size != self.page_size {
            tracing::warn!(
                requested = self.page_size,
                using = page_size,
                "page_size out of range, clamped"
            );
        }
        GatewaySettings {
            provider: self.provider,
            base_url: self.base_url.clone(),
            api_key,
            options: QueryOptions {
                language: self.language.clone(),
                country: self.country.clone(),
                page_size,
            },
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }

    pub fn feed_settings(&self) -> FeedSettings {
        let ttl_secs = i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX / 1000);
        FeedSettings {
            ttl: chrono::Duration::seconds(ttl_secs.min(i64::MAX / 1000)),
            default_category: self.default_category.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("newsdesk_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::GNews);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.request_timeout_secs, 0);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdesk_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.default_category, "general");
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "full",
            r#"
provider = "newsapi"
api_key = "file-key"
base_url = "http://localhost:9000"
language = "de"
country = "de"
page_size = 20
cache_ttl_secs = 60
min_request_interval_ms = 0
request_timeout_secs = 15
default_category = "technology"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.provider, Provider::NewsApi);
        assert_eq!(config.page_size, 20);

        let gateway = config.gateway_settings(None);
        assert_eq!(gateway.options.country, "de");
        assert_eq!(gateway.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(gateway.min_request_interval, Duration::ZERO);

        let feed = config.feed_settings();
        assert_eq!(feed.ttl, chrono::Duration::seconds(60));
        assert_eq!(feed.default_category, "technology");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_provider_is_parse_error() {
        let path = write_config("bad_provider", "provider = \"bing\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "language = \"fr\"\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.language, "fr");
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
    }

    #[test]
    fn test_env_key_overrides_file() {
        let config = Config {
            api_key: Some("file-key".into()),
            ..Config::default()
        };
        let key = config.resolve_api_key(Some("env-key".into())).unwrap();
        assert_eq!(key.expose_secret(), "env-key");

        let key = config.resolve_api_key(Some("  ".into())).unwrap();
        assert_eq!(key.expose_secret(), "file-key");

        assert!(Config::default().resolve_api_key(None).is_none());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        assert_eq!(Config::default().gateway_settings(None).request_timeout, None);
    }

    #[test]
    fn test_page_size_clamped() {
        let config = Config {
            page_size: 0,
            ..Config::default()
        };
        assert_eq!(config.gateway_settings(None).options.page_size, 1);
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".into()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
