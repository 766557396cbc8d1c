//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's built-in axum webhook support to:
//! - Automatically call `setWebhook` on Telegram
//! - Spawn an axum HTTP server to receive updates
//! - Automatically call `deleteWebhook` on shutdown
//!
//! The listener registers the webhook without an update filter and ignores
//! the dispatcher's hint, so the webhook is registered a second time with
//! [`allowed_updates`].

use std::net::SocketAddr;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::{BotDispatcher, ThrottledBot};
use crate::config::Config;

/// Update kinds the handlers consume. Telegram's default set leaves out
/// `chat_member`, which the member-left handler depends on.
pub fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![
        AllowedUpdate::Message,
        AllowedUpdate::ChatJoinRequest,
        AllowedUpdate::ChatMember,
    ]
}

/// Register the webhook and dispatch updates received on it.
pub async fn start_webhook(
    config: &Config,
    mut dispatcher: BotDispatcher,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;

    let url = Url::parse(webhook_url).context("Invalid WEBHOOK_URL format")?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url.clone());

    if let Some(ref secret) = config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    // Fixed up front so both registrations use the same token
    let secret = options.get_or_gen_secret_token().to_owned();

    info!("Setting webhook URL: {}", url);
    info!("Listening on: {}", address);

    // Webhook setup only needs basic API access, so the unthrottled bot is enough
    let listener = webhooks::axum(bot.inner().clone(), options)
        .await
        .context("Failed to setup webhook")?;

    bot.inner()
        .set_webhook(url)
        .secret_token(secret)
        .allowed_updates(allowed_updates())
        .await
        .context("Failed to register allowed updates")?;

    info!("Webhook setup complete, waiting for updates...");

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");

    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_updates_cover_handlers() {
        let updates = allowed_updates();

        assert!(updates.contains(&AllowedUpdate::Message));
        assert!(updates.contains(&AllowedUpdate::ChatJoinRequest));
        assert!(updates.contains(&AllowedUpdate::ChatMember));
    }
}
