//! Database models.

pub mod flag;

pub use flag::FlagEntry;
