//! Database module exports.

pub mod flags;
mod models;
mod mongo;
mod repository;

pub use flags::{user_key, FlagStore, MemoryFlagStore};
pub use mongo::Database;
pub use repository::FlagRepository;
