//! /start command plugin.
//!
//! Answers `/start` and the "СТАРТ" reply button with the about message and
//! tells the reports peer who pressed it.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info, warn};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::{Keyboard, LinkButton, TextFormat};
use crate::config::Settings;
use crate::content::ContentSlot;
use crate::utils::{user_chat, Profile};

/// Label of the reply button sent with the welcome.
pub const START_LABEL: &str = "СТАРТ";

/// Whether a plain text message is a press of the start button.
pub fn is_start_text(text: &str) -> bool {
    text.starts_with(START_LABEL)
}

/// Inline row with the strategy and reviews links. Unset links are left out.
pub fn promo_keyboard(settings: &Settings) -> Keyboard {
    let links = [
        ("💎 СТРАТЕГИЯ 💎", "STRATEGY", &settings.strategy_url),
        ("✍🏻 ОТЗЫВЫ ✍🏻", "REVIEWS", &settings.reviews_url),
    ];

    let buttons = links
        .into_iter()
        .filter_map(|(text, key, url)| match url {
            Some(url) => Some(LinkButton::new(text, url.clone())),
            None => {
                warn!("{} link is not configured, button skipped", key);
                None
            }
        })
        .collect();

    Keyboard::Links(buttons)
}

/// Handle `/start` or the start button.
pub async fn start_handler(msg: Message, state: AppState) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    on_start(&state, msg.chat.id, msg.id, &Profile::from(user)).await
}

/// Delete the trigger, send the about message and notify the reports peer.
pub async fn on_start(
    state: &AppState,
    chat_id: ChatId,
    message_id: MessageId,
    profile: &Profile,
) -> Result<()> {
    if let Err(e) = state.messenger.delete_message(chat_id, message_id).await {
        warn!("Cannot delete start message in {}: {:#}", chat_id, e);
    }

    let caption = state.content.get(ContentSlot::About).await?;
    let settings = state.settings.get();

    state
        .messenger
        .send_photo(
            user_chat(profile.id),
            &state.media.about(),
            &caption,
            promo_keyboard(&settings),
        )
        .await?;

    info!("Sent about message to {}", profile.id);

    match settings.reports {
        Some(reports) => {
            let text = format!(
                "Пользователь {} нажал на кнопку СТАРТ",
                profile.display_name()
            );
            state
                .messenger
                .send_text(reports, &text, TextFormat::Plain)
                .await?;
        }
        None => debug!("No reports peer configured"),
    }

    Ok(())
}
