//! Configuration module for the welcomer bot.
//!
//! Process configuration comes from environment variables (optionally via a
//! `.env` file). Bot-level settings such as the admin id and promotional links
//! live in a JSON file, see [`settings`].

pub mod settings;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use settings::{Settings, SettingsLoader};

/// Default delay before the warm-up follow-up is sent.
const DEFAULT_WARMUP_DELAY_SECS: u64 = 300;

/// Bot running mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("WEBHOOK_URL must be set when BOT_MODE is webhook")]
    MissingWebhookUrl,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// MongoDB connection string. Without it the bot keeps its state in memory.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    // Files
    pub settings_file: PathBuf,
    pub content_file: PathBuf,
    pub media_dir: PathBuf,

    /// How long to wait after the welcome before sending the warm-up.
    pub warmup_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = var("BOT_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let bot_mode = match var("BOT_MODE")
            .unwrap_or_else(|| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::MissingWebhookUrl);
        }

        let webhook_port = parse_or("WEBHOOK_PORT", var("WEBHOOK_PORT"), 8443)?;
        let warmup_secs = parse_or(
            "WARMUP_DELAY_SECS",
            var("WARMUP_DELAY_SECS"),
            DEFAULT_WARMUP_DELAY_SECS,
        )?;

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: var("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            mongodb_uri: var("MONGODB_URI").filter(|s| !s.is_empty()),
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "welcomer".to_string()),
            settings_file: var("SETTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cfg.json")),
            content_file: var("CONTENT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("db.json")),
            media_dir: var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("img")),
            warmup_delay: Duration::from_secs(warmup_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
