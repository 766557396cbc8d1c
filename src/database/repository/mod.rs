//! Repository module - MongoDB data access layer.

mod flag_repository;

pub use flag_repository::FlagRepository;
