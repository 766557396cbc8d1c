//! Bot settings stored in `cfg.json`.
//!
//! The file is a flat JSON object:
//!
//! ```json
//! {
//!     "ADMIN": "123456789",
//!     "REPORTS": "-100987654321",
//!     "SENDERS": ["123456789", 555],
//!     "STRATEGY": "https://example.com/strategy",
//!     "REVIEWS": "https://example.com/reviews"
//! }
//! ```
//!
//! Ids may be written as strings or numbers. Settings are loaded once: after
//! the first successful read the values stay fixed for the lifetime of the
//! [`SettingsLoader`], even if the file changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use teloxide::types::{ChatId, UserId};
use tracing::{info, warn};
use url::Url;

/// Parsed bot settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Admin peer. Receives error reports and is never sent a farewell.
    pub admin: Option<ChatId>,
    /// Peer notified when someone presses the start button.
    pub reports: Option<ChatId>,
    /// Users allowed to run `/sendMessage`.
    pub senders: Vec<UserId>,
    pub strategy_url: Option<Url>,
    pub reviews_url: Option<Url>,
}

impl Settings {
    /// Whether the given user is the configured admin.
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin
            .is_some_and(|admin| i64::try_from(user_id.0).is_ok_and(|id| admin.0 == id))
    }

    /// Whether the given user may broadcast.
    pub fn is_sender(&self, user_id: UserId) -> bool {
        self.senders.contains(&user_id)
    }
}

/// Raw file layout before validation.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(rename = "ADMIN", default)]
    admin: Option<Value>,
    #[serde(rename = "REPORTS", default)]
    reports: Option<Value>,
    #[serde(rename = "SENDERS", default)]
    senders: Vec<Value>,
    #[serde(rename = "STRATEGY", default)]
    strategy: Option<String>,
    #[serde(rename = "REVIEWS", default)]
    reviews: Option<String>,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self {
            admin: raw.admin.as_ref().and_then(parse_id).map(ChatId),
            reports: raw.reports.as_ref().and_then(parse_id).map(ChatId),
            senders: raw
                .senders
                .iter()
                .filter_map(|v| {
                    let id = parse_id(v).and_then(|id| u64::try_from(id).ok());
                    if id.is_none() {
                        warn!("Ignoring invalid SENDERS entry: {}", v);
                    }
                    id
                })
                .map(UserId)
                .collect(),
            strategy_url: raw.strategy.as_deref().and_then(|s| parse_url("STRATEGY", s)),
            reviews_url: raw.reviews.as_deref().and_then(|s| parse_url("REVIEWS", s)),
        }
    }
}

/// Accept `123`, `"123"` and `" -100123 "`; everything else is treated as unset.
fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_url(key: &str, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Invalid {} url {:?}: {}", key, raw, e);
            None
        }
    }
}

/// Minimum time between two reads of a missing or broken settings file.
const RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Load-once holder for [`Settings`].
///
/// A failed read is not cached, so a missing file can be added without a
/// restart. Failed reads are retried at most once per [`RETRY_INTERVAL`].
/// Once a read succeeds the result is kept forever.
#[derive(Debug)]
pub struct SettingsLoader {
    path: PathBuf,
    cell: OnceCell<Arc<Settings>>,
    last_failure: Mutex<Option<Instant>>,
    retry_interval: Duration,
}

impl SettingsLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
            last_failure: Mutex::new(None),
            retry_interval: RETRY_INTERVAL,
        }
    }

    /// Create a loader that already holds the given settings.
    #[cfg(test)]
    pub fn preloaded(settings: Settings) -> Self {
        Self {
            cell: OnceCell::with_value(Arc::new(settings)),
            ..Self::new(PathBuf::new())
        }
    }

    #[cfg(test)]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Current settings. Empty settings are returned while the file cannot be read.
    pub fn get(&self) -> Arc<Settings> {
        if let Some(settings) = self.cell.get() {
            return Arc::clone(settings);
        }

        // Held across the read so concurrent callers don't all hit the disk
        let mut last_failure = self.last_failure.lock();
        if last_failure.is_some_and(|at| at.elapsed() < self.retry_interval) {
            return Arc::new(Settings::default());
        }

        match self.cell.get_or_try_init(|| read_settings(&self.path).map(Arc::new)) {
            Ok(settings) => {
                *last_failure = None;
                Arc::clone(settings)
            }
            Err(e) => {
                *last_failure = Some(Instant::now());
                warn!(
                    "Settings unavailable, next attempt in {:?}: {:#}",
                    self.retry_interval, e
                );
                Arc::new(Settings::default())
            }
        }
    }

    /// Whether a successful load has happened.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let raw: RawSettings = serde_json::from_str(&json)
        .with_context(|| format!("parsing {}", path.display()))?;
    let settings = Settings::from(raw);
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("cfg.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_mixed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            r#"{"ADMIN": "42", "REPORTS": -100500, "SENDERS": ["1", 2, "x"],
                "STRATEGY": "https://example.com/s", "REVIEWS": ""}"#,
        );

        let settings = SettingsLoader::new(path).get();

        assert_eq!(settings.admin, Some(ChatId(42)));
        assert_eq!(settings.reports, Some(ChatId(-100500)));
        assert_eq!(settings.senders, vec![UserId(1), UserId(2)]);
        assert_eq!(settings.strategy_url.as_ref().map(Url::as_str), Some("https://example.com/s"));
        assert!(settings.reviews_url.is_none());
        assert!(settings.is_admin(UserId(42)));
        assert!(!settings.is_admin(UserId(43)));
        assert!(settings.is_sender(UserId(2)));
    }

    #[test]
    fn test_missing_file_is_empty_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let loader =
            SettingsLoader::new(dir.path().join("cfg.json")).with_retry_interval(Duration::ZERO);

        assert_eq!(*loader.get(), Settings::default());
        assert!(!loader.is_loaded());

        write_file(&dir, r#"{"ADMIN": "7"}"#);
        assert_eq!(loader.get().admin, Some(ChatId(7)));
        assert!(loader.is_loaded());
    }

    #[test]
    fn test_failed_read_is_not_retried_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let loader = SettingsLoader::new(dir.path().join("cfg.json"));

        assert_eq!(*loader.get(), Settings::default());

        // The file shows up, but the next read is only due after the interval
        write_file(&dir, r#"{"ADMIN": "7"}"#);
        assert_eq!(*loader.get(), Settings::default());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "{ not json");
        let loader = SettingsLoader::new(path);

        assert_eq!(*loader.get(), Settings::default());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn test_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, r#"{"ADMIN": "1", "SENDERS": ["1"]}"#);
        let loader = SettingsLoader::new(&path);

        let first = loader.get();
        write_file(&dir, r#"{"ADMIN": "2", "SENDERS": []}"#);
        let second = loader.get();

        assert_eq!(first, second);
        assert_eq!(second.admin, Some(ChatId(1)));
        assert_eq!(second.senders, vec![UserId(1)]);
    }
}
