//! Member left handler.
//!
//! Says goodbye to users leaving the channel and drops them from the queue.

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberUpdated, UserId};
use tracing::{debug, info};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::TextFormat;
use crate::content::ContentSlot;
use crate::database::user_key;
use crate::utils::user_chat;

/// Returns the handler for member leave events.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(is_member_left).endpoint(member_left_handler)
}

/// Only the plain "left" state counts, kicks and bans do not.
fn is_member_left(update: ChatMemberUpdated) -> bool {
    update.new_chat_member.kind.is_left()
}

async fn member_left_handler(update: ChatMemberUpdated, state: AppState) -> Result<()> {
    debug!(
        "Member {} left chat {}",
        update.new_chat_member.user.id, update.chat.id
    );
    on_member_left(&state, update.new_chat_member.user.id).await
}

/// Cancel the pending warm-up, forget the user and send the farewell.
pub async fn on_member_left(state: &AppState, user_id: UserId) -> Result<()> {
    if state.settings.get().is_admin(user_id) {
        debug!("Admin {} left, ignoring", user_id);
        return Ok(());
    }

    let cancelled = state.warmups.cancel(user_id);
    let removed = state.queue.delete(&user_key(user_id)).await?;

    let farewell = state.content.get(ContentSlot::Faraway).await?;
    state
        .messenger
        .send_text(user_chat(user_id), &farewell, TextFormat::Markdown)
        .await?;

    info!(
        "Said goodbye to {} (queued: {}, warm-up cancelled: {})",
        user_id, removed, cancelled
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::database::FlagStore;
    use crate::events::join_request::on_join_request;
    use crate::testing::{profile, Harness, Outbound, ADMIN};

    fn member_update(new_member: &str) -> ChatMemberUpdated {
        let json = format!(
            r#"{{
                "chat": {{"id": -1001, "title": "Club", "type": "supergroup"}},
                "from": {{"id": 5, "is_bot": false, "first_name": "Ann"}},
                "date": 1700000000,
                "old_chat_member": {{"user": {{"id": 5, "is_bot": false, "first_name": "Ann"}}, "status": "member"}},
                "new_chat_member": {{"user": {{"id": 5, "is_bot": false, "first_name": "Ann"}}, {new_member}}}
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_only_plain_leave_passes_filter() {
        assert!(is_member_left(member_update(r#""status": "left""#)));
        assert!(!is_member_left(member_update(r#""status": "kicked", "until_date": 0"#)));
        assert!(!is_member_left(member_update(r#""status": "member""#)));
    }

    #[tokio::test]
    async fn test_admin_leaving_is_noop() {
        let h = Harness::new();
        let admin_key = ADMIN.to_string();
        h.queue.set(&admin_key, true).await.unwrap();

        on_member_left(&h.state, UserId(ADMIN)).await.unwrap();

        assert!(h.messenger.sent().is_empty());
        assert!(h.queue.contains(&admin_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_member_leaving_gets_farewell_and_is_removed() {
        let h = Harness::new();
        h.queue.set("8", true).await.unwrap();

        on_member_left(&h.state, UserId(8)).await.unwrap();

        assert_eq!(
            h.messenger.sent(),
            vec![Outbound::Text {
                chat_id: ChatId(8),
                text: "Жаль, что вы ушли".to_string(),
                format: TextFormat::Markdown,
            }]
        );
        assert!(!h.queue.contains("8").await.unwrap());
    }

    #[tokio::test]
    async fn test_unqueued_member_leaving_is_not_an_error() {
        let h = Harness::new();

        on_member_left(&h.state, UserId(9)).await.unwrap();
        on_member_left(&h.state, UserId(9)).await.unwrap();

        assert_eq!(h.messenger.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_leaving_during_delay_cancels_warmup() {
        let h = Harness::with_delay(Duration::from_millis(60));

        on_join_request(&h.state, ChatId(-1), &profile(4, "Oleg")).await.unwrap();
        on_member_left(&h.state, UserId(4)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        let warmups = h
            .messenger
            .sent_to(ChatId(4))
            .into_iter()
            .filter(|o| matches!(o, Outbound::Photo { photo, .. } if photo.ends_with("warmup.jpg")))
            .count();
        assert_eq!(warmups, 0);
        assert!(!h.queue.contains("4").await.unwrap());
        assert!(!h.state.warmups.is_pending(UserId(4)));
    }
}
