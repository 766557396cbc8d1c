//! Join request handler.
//!
//! Approves the request, greets the user privately and schedules the
//! delayed warm-up message for users that have not been queued yet.

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatJoinRequest, UserId};
use tracing::{debug, info};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::Keyboard;
use crate::content::ContentSlot;
use crate::database::user_key;
use crate::plugins::start::{promo_keyboard, START_LABEL};
use crate::utils::{escape_markdown, user_chat, Profile};

/// Returns the handler for chat join requests.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|request: ChatJoinRequest| !request.from.is_bot).endpoint(join_request_handler)
}

async fn join_request_handler(request: ChatJoinRequest, state: AppState) -> Result<()> {
    let profile = Profile::from(&request.from);
    on_join_request(&state, request.chat.id, &profile).await
}

/// Approve, welcome and queue a user that asked to join `chat_id`.
pub async fn on_join_request(state: &AppState, chat_id: ChatId, profile: &Profile) -> Result<()> {
    let user_id = profile.id;

    state.messenger.approve_join_request(chat_id, user_id).await?;
    debug!("Approved join request of {} to {}", user_id, chat_id);

    let welcome = state.content.get(ContentSlot::Welcome).await?;
    let caption = format!("{}{}", escape_markdown(&profile.display_name()), welcome);

    state
        .messenger
        .send_photo(
            user_chat(user_id),
            &state.media.start(),
            &caption,
            Keyboard::Reply {
                label: START_LABEL.to_string(),
            },
        )
        .await?;

    let key = user_key(user_id);
    state.welcome_sent.set(&key, true).await?;
    info!("Sent welcome to {} ({})", profile.display_name(), user_id);

    if state.queue.contains(&key).await? || state.warmups.is_pending(user_id) {
        debug!("User {} already queued, skipping warm-up", user_id);
        return Ok(());
    }

    let task_state = state.clone();
    state
        .warmups
        .schedule(user_id, state.warmup_delay, async move {
            if let Err(e) = send_warmup(&task_state, user_id).await {
                let e = e.context(format!("warm-up for user {}", user_id));
                task_state.reporter.report(&e).await;
            }
        });
    debug!("{} warm-ups pending", state.warmups.len());

    Ok(())
}

/// Send the warm-up message and mark the user as queued.
pub async fn send_warmup(state: &AppState, user_id: UserId) -> Result<()> {
    let caption = state.content.get(ContentSlot::Warmup).await?;
    let keyboard = promo_keyboard(&state.settings.get());

    state
        .messenger
        .send_photo(user_chat(user_id), &state.media.warmup(), &caption, keyboard)
        .await?;

    state.queue.set(&user_key(user_id), true).await?;
    info!("Sent warm-up to {}", user_id);

    Ok(())
}
