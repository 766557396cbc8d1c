//! MongoDB-backed flag store with a read-through cache.

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::flags::FlagStore;
use crate::database::models::FlagEntry;
use crate::database::Database;

/// Flag collection in MongoDB.
pub struct FlagRepository {
    collection: Collection<FlagEntry>,
    cache: TypedCache<String, bool>,
}

impl FlagRepository {
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection(name),
            cache: TypedCache::new(name, CacheConfig::user_flags()),
        }
    }

    /// Create the unique index on `key`.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        debug!("Ensured index on {}.key", self.cache.name());
        Ok(())
    }
}

#[async_trait]
impl FlagStore for FlagRepository {
    async fn get(&self, key: &str) -> Result<Option<bool>> {
        let key = key.to_string();
        if let Some(value) = self.cache.get(&key) {
            return Ok(Some(value));
        }

        let result = self.collection.find_one(doc! { "key": key.as_str() }).await?;
        let value = result.map(|entry| entry.value);

        if let Some(v) = value {
            self.cache.insert(key, v);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: bool) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "key": key }, FlagEntry::new(key, value))
            .with_options(options)
            .await?;

        self.cache.insert(key.to_string(), value);
        debug!("Set {}[{}] = {}", self.cache.name(), key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "key": key }).await?;
        self.cache.invalidate(&key.to_string());

        debug!(
            "Deleted {}[{}]: {}",
            self.cache.name(),
            key,
            result.deleted_count > 0
        );
        Ok(result.deleted_count > 0)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries: Vec<FlagEntry> = self.collection.find(doc! {}).await?.try_collect().await?;
        Ok(entries.into_iter().map(|entry| entry.key).collect())
    }
}
