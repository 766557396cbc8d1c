//! Cache module - small typed caches on top of Moka.
//!
//! Used by the MongoDB flag stores so repeated membership checks for the
//! same user do not hit the database.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
