//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command, join-request and member handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio::sync::Notify;

use super::messenger::Messenger;
use super::reporter::ErrorReporter;
use crate::config::SettingsLoader;
use crate::content::ContentStore;
use crate::database::FlagStore;
use crate::events;
use crate::plugins;
use crate::warmup::WarmupScheduler;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Dispatcher type used by the runtime.
pub type BotDispatcher = Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>;

/// Photos attached to the bot's messages.
#[derive(Debug, Clone)]
pub struct MediaFiles {
    dir: PathBuf,
}

impl MediaFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sent with the welcome on join.
    pub fn start(&self) -> PathBuf {
        self.dir.join("start.jpg")
    }

    /// Sent with the delayed follow-up.
    pub fn warmup(&self) -> PathBuf {
        self.dir.join("warmup.jpg")
    }

    /// Sent in reply to `/start`.
    pub fn about(&self) -> PathBuf {
        self.dir.join("welcome.jpg")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Outbound Telegram calls.
    pub messenger: Arc<dyn Messenger>,

    /// Load-once bot settings (`cfg.json`).
    pub settings: Arc<SettingsLoader>,

    /// Message texts (`db.json`), re-read on every access.
    pub content: Arc<ContentStore>,

    /// Users that already got the warm-up.
    pub queue: Arc<dyn FlagStore>,

    /// Users that receive broadcasts.
    pub welcome_sent: Arc<dyn FlagStore>,

    /// Pending warm-up tasks.
    pub warmups: WarmupScheduler,

    pub reporter: ErrorReporter,

    pub media: MediaFiles,

    pub warmup_delay: Duration,

    /// Signalled by `/restart`.
    pub restart: Arc<Notify>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        messenger: Arc<dyn Messenger>,
        settings: Arc<SettingsLoader>,
        content: Arc<ContentStore>,
        queue: Arc<dyn FlagStore>,
        welcome_sent: Arc<dyn FlagStore>,
        media_dir: PathBuf,
        warmup_delay: Duration,
    ) -> Self {
        let reporter = ErrorReporter::new(Arc::clone(&messenger), Arc::clone(&settings));

        Self {
            messenger,
            settings,
            content,
            queue,
            welcome_sent,
            warmups: WarmupScheduler::new(),
            reporter,
            media: MediaFiles::new(media_dir),
            warmup_delay,
            restart: Arc::new(Notify::new()),
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState) -> BotDispatcher {
    let reporter = Arc::new(state.reporter.clone());

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .error_handler(reporter)
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, then the start button text, then the catch-all
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(plugins::start_text_handler())
        .branch(dptree::endpoint(plugins::ignore_message));

    let join_handler = Update::filter_chat_join_request().branch(events::join_request::handler());

    let member_handler = Update::filter_chat_member().branch(events::member_left::handler());

    dptree::entry()
        .branch(message_handler)
        .branch(join_handler)
        .branch(member_handler)
}
