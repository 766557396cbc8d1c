//! Bot runtime - Polling and Webhook runners.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, warn};

use super::dispatcher::{BotDispatcher, ThrottledBot};
use super::webhook;
use crate::config::{BotMode, Config};

/// Run the bot with the configured mode until Ctrl+C or a restart request.
pub async fn run(
    config: &Config,
    mut dispatcher: BotDispatcher,
    bot: ThrottledBot,
    restart: Arc<Notify>,
) -> anyhow::Result<()> {
    watch_restart(&dispatcher, restart);

    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            dispatcher.dispatch().await;
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            webhook::start_webhook(config, dispatcher, bot).await?;
        }
    }

    info!("Dispatcher stopped");
    Ok(())
}

/// Stop the dispatcher gracefully once a restart is requested.
fn watch_restart(dispatcher: &BotDispatcher, restart: Arc<Notify>) {
    let token = dispatcher.shutdown_token();

    tokio::spawn(async move {
        restart.notified().await;
        info!("Restart requested, stopping dispatcher...");

        match token.shutdown() {
            Ok(stopped) => stopped.await,
            Err(e) => warn!("Cannot stop dispatcher: {}", e),
        }
    });
}
