//! Bot module - Core bot functionality.

pub mod dispatcher;
pub mod messenger;
pub mod reporter;
mod runtime;
mod webhook;

pub use dispatcher::{build_dispatcher, AppState};
pub use messenger::TelegramMessenger;
pub use runtime::run;
