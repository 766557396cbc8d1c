//! Message content stored in `db.json`.
//!
//! Content is read from disk on every lookup so edits take effect without a
//! restart. A slot missing from the file is an error, never an empty string.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Named text slots used by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSlot {
    /// Caption appended to the member's name on join.
    Welcome,
    /// Caption of the delayed follow-up.
    Warmup,
    /// Caption sent on `/start`.
    About,
    /// Farewell text for members that left.
    Faraway,
}

impl ContentSlot {
    pub fn key(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Warmup => "warmup",
            Self::About => "about",
            Self::Faraway => "faraway",
        }
    }
}

impl fmt::Display for ContentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("content slot '{slot}' is missing from {file}")]
    Missing { slot: ContentSlot, file: String },
}

/// Reader for the content file.
#[derive(Debug, Clone)]
pub struct ContentStore {
    path: PathBuf,
}

impl ContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the whole file. Unreadable or malformed files yield an empty map.
    pub async fn load(&self) -> HashMap<String, String> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) => {
                warn!("Cannot read content file {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(map) => map,
            Err(e) => {
                warn!("Cannot parse content file {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }

    /// Fetch one slot, fresh from disk.
    pub async fn get(&self, slot: ContentSlot) -> Result<String, ContentError> {
        self.load()
            .await
            .remove(slot.key())
            .ok_or_else(|| ContentError::Missing {
                slot,
                file: self.path.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"welcome": ", привет!", "about": "*About*"}"#).unwrap();

        let store = ContentStore::new(&path);

        assert_eq!(store.get(ContentSlot::Welcome).await.unwrap(), ", привет!");
        assert_eq!(store.get(ContentSlot::About).await.unwrap(), "*About*");
    }

    #[tokio::test]
    async fn test_missing_slot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"welcome": "hi"}"#).unwrap();

        let err = ContentStore::new(&path).get(ContentSlot::Faraway).await.unwrap_err();

        assert!(matches!(err, ContentError::Missing { slot: ContentSlot::Faraway, .. }));
        assert!(err.to_string().contains("faraway"));
    }

    #[tokio::test]
    async fn test_missing_or_broken_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = ContentStore::new(&path);

        assert!(store.load().await.is_empty());
        assert!(store.get(ContentSlot::Welcome).await.is_err());

        std::fs::write(&path, "[1, 2").unwrap();
        assert!(store.get(ContentSlot::Welcome).await.is_err());
    }

    #[tokio::test]
    async fn test_reread_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"warmup": "old"}"#).unwrap();
        let store = ContentStore::new(&path);

        assert_eq!(store.get(ContentSlot::Warmup).await.unwrap(), "old");

        std::fs::write(&path, r#"{"warmup": "new"}"#).unwrap();
        assert_eq!(store.get(ContentSlot::Warmup).await.unwrap(), "new");
    }
}
