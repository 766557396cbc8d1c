//! /sendMessage command plugin.
//!
//! Relays text from an allowed sender to every user that got the welcome.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::UserId;
use tracing::{debug, info, warn};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::TextFormat;
use crate::database::user_key;
use crate::utils::user_chat;

pub const USAGE: &str = "Использование: /sendMessage <текст>";

/// What a `/sendMessage` invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Sender is not on the allow-list. Nothing was sent.
    Unauthorized,
    /// No text given. The usage hint was sent back.
    Usage,
    Sent { delivered: usize, failed: usize },
}

/// Handle `/sendMessage <text>`.
pub async fn send_message_command(msg: Message, state: AppState, args: String) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    on_broadcast(&state, user.id, &args).await?;
    Ok(())
}

/// Relay `text` to the welcome-sent set, skipping the sender.
pub async fn on_broadcast(state: &AppState, sender: UserId, text: &str) -> Result<BroadcastOutcome> {
    if !state.settings.get().is_sender(sender) {
        debug!("Ignoring /sendMessage from {}", sender);
        return Ok(BroadcastOutcome::Unauthorized);
    }

    let text = text.trim();
    if text.is_empty() {
        state
            .messenger
            .send_text(user_chat(sender), USAGE, TextFormat::Plain)
            .await?;
        return Ok(BroadcastOutcome::Usage);
    }

    let sender_key = user_key(sender);
    let mut delivered = 0;
    let mut failed = 0;

    for key in state.welcome_sent.keys().await? {
        if key == sender_key {
            continue;
        }

        let Ok(id) = key.parse::<u64>() else {
            warn!("Skipping invalid welcome_sent key {:?}", key);
            continue;
        };

        match state
            .messenger
            .send_text(user_chat(UserId(id)), text, TextFormat::Plain)
            .await
        {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!("Broadcast to {} failed: {:#}", id, e);
                failed += 1;
            }
        }
    }

    info!(
        "Broadcast from {}: {} delivered, {} failed",
        sender, delivered, failed
    );
    Ok(BroadcastOutcome::Sent { delivered, failed })
}
