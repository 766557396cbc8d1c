//! String-keyed boolean stores.
//!
//! The bot keeps two of them: the warm-up `queue` and the `welcome_sent` set
//! used for broadcasts. Keys are user ids rendered as decimal strings.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use teloxide::types::UserId;

/// Persistent map from string key to boolean.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<bool>>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: bool) -> Result<()>;

    /// Remove `key`. Returns whether something was removed; absence is not an error.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All stored keys, in no particular order.
    async fn keys(&self) -> Result<Vec<String>>;

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Key under which a user is stored.
pub fn user_key(user_id: UserId) -> String {
    user_id.0.to_string()
}

/// In-process store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    entries: DashMap<String, bool>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.entries.get(key).map(|v| *v))
    }

    async fn set(&self, key: &str, value: bool) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}
