//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Matrix service, the command prefix, prompt timeouts and storage.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Global command settings. Rooms may override both through their profile.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            locale: default_locale(),
        }
    }
}

fn default_prefix() -> String {
    "rss.".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    /// Template used for feeds without a custom message.
    #[serde(default = "default_message")]
    pub default_message: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            default_message: default_message(),
        }
    }
}

fn default_message() -> String {
    ":newspaper:  |  **{title}**\n\n{link}\n\n{subscriptions}".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptsConfig {
    /// Seconds a single prompt waits for a valid answer.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_exit_keyword")]
    pub exit_keyword: String,
}

impl PromptsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            exit_keyword: default_exit_keyword(),
        }
    }
}

fn default_timeout() -> u64 {
    90
}

fn default_exit_keyword() -> String {
    "exit".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "data/feeds.json".to_string()
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
services:
  matrix:
    username: "@bot:example.org"
    password: "hunter2"
    homeserver: "https://matrix.example.org"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.bot.prefix, "rss.");
        assert_eq!(config.bot.locale, "en-US");
        assert_eq!(config.prompts.timeout(), Duration::from_secs(90));
        assert_eq!(config.prompts.exit_keyword, "exit");
        assert_eq!(config.storage.path, "data/feeds.json");
        assert!(config.feeds.default_message.contains("{subscriptions}"));
    }

    #[test]
    fn test_overrides() {
        let yaml = format!(
            "{MINIMAL}bot:\n  prefix: \"!\"\nprompts:\n  timeout_secs: 5\nfeeds:\n  default_message: \"{{link}}\"\n"
        );
        let config = AppConfig::parse(&yaml).unwrap();
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.bot.locale, "en-US");
        assert_eq!(config.prompts.timeout_secs, 5);
        assert_eq!(config.feeds.default_message, "{link}");
    }

    #[test]
    fn test_example_config_parses() {
        let config = AppConfig::parse(include_str!("../../data/config.example.yaml")).unwrap();
        assert_eq!(config.services.matrix.display_name.as_deref(), Some("Feed Bot"));
        assert_eq!(
            config.feeds.default_message,
            FeedsConfig::default().default_message
        );
    }

    #[test]
    fn test_missing_matrix_section_fails() {
        assert!(AppConfig::parse("bot:\n  prefix: \"!\"\n").is_err());
    }
}
