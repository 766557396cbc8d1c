//! /restart command plugin.
//!
//! Stops the dispatcher gracefully; the process supervisor starts it again.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::UserId;
use tracing::{debug, info};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::TextFormat;

/// Handle `/restart`. Only the admin may use it.
pub async fn restart_command(msg: Message, state: AppState) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    on_restart(&state, user.id, msg.chat.id).await?;
    Ok(())
}

/// Request a restart. Returns whether the request was accepted.
pub async fn on_restart(state: &AppState, user_id: UserId, chat_id: ChatId) -> Result<bool> {
    if !state.settings.get().is_admin(user_id) {
        debug!("Ignoring /restart from {}", user_id);
        return Ok(false);
    }

    info!("Restart requested by {}", user_id);
    state
        .messenger
        .send_text(chat_id, "Перезапуск...", TextFormat::Plain)
        .await?;
    state.restart.notify_one();

    Ok(true)
}
