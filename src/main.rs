//! Welcomer - join request greeter bot
//!
//! Approves join requests, greets new members, follows up with a delayed
//! warm-up message and relays admin broadcasts.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration and `cfg.json` settings
//! - `content` - Message texts from `db.json`
//! - `database` - Flag stores (MongoDB or in-memory)
//! - `cache` - Moka caches in front of MongoDB
//! - `warmup` - Cancellable delayed warm-up tasks
//! - `bot` - Dispatcher, outbound messenger, error reporting, runtime
//! - `plugins` - Command handlers
//! - `events` - Join request and member left handlers
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod content;
mod database;
mod events;
mod plugins;
mod utils;
mod warmup;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot::{AppState, TelegramMessenger};
use config::{Config, SettingsLoader};
use content::ContentStore;
use database::{Database, FlagRepository, FlagStore, MemoryFlagStore};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("welcomer=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting welcomer bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    let settings = Arc::new(SettingsLoader::new(&config.settings_file));
    let admin = settings.get().admin;
    if !settings.is_loaded() {
        warn!(
            "Cannot load {} yet, running with empty settings",
            settings.path().display()
        );
    } else if admin.is_none() {
        warn!(
            "No ADMIN in {}, errors will only be logged",
            settings.path().display()
        );
    }

    let content = Arc::new(ContentStore::new(&config.content_file));
    let (queue, welcome_sent) = open_stores(&config).await?;

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    let state = AppState::new(
        Arc::new(TelegramMessenger::new(bot.clone())),
        settings,
        content,
        queue,
        welcome_sent,
        config.media_dir.clone(),
        config.warmup_delay,
    );
    info!(
        "Media from {}, warm-up after {:?}",
        state.media.dir().display(),
        state.warmup_delay
    );

    let restart = Arc::clone(&state.restart);
    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    bot::run(&config, dispatcher, bot, restart).await?;

    info!("Bye");
    Ok(())
}

type Stores = (Arc<dyn FlagStore>, Arc<dyn FlagStore>);

/// Open the `queue` and `welcome_sent` stores.
async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    let Some(uri) = config.mongodb_uri.as_deref() else {
        warn!("MONGODB_URI not set, keeping state in memory (lost on restart)");
        let queue: Arc<dyn FlagStore> = Arc::new(MemoryFlagStore::new());
        let welcome_sent: Arc<dyn FlagStore> = Arc::new(MemoryFlagStore::new());
        return Ok((queue, welcome_sent));
    };

    info!("Connecting to MongoDB...");
    let db = Database::connect(uri, &config.mongodb_database).await?;

    let queue = FlagRepository::new(&db, "queue");
    let welcome_sent = FlagRepository::new(&db, "welcome_sent");
    queue.ensure_indexes().await?;
    welcome_sent.ensure_indexes().await?;
    info!("Database connected");

    let queue: Arc<dyn FlagStore> = Arc::new(queue);
    let welcome_sent: Arc<dyn FlagStore> = Arc::new(welcome_sent);
    Ok((queue, welcome_sent))
}
