//! Utility functions.
//!
//! Collection of helper functions used across the bot.

use teloxide::types::{ChatId, User, UserId};

/// The parts of a Telegram user the handlers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        }
    }
}

impl Profile {
    /// `first last` if present, otherwise `@username`.
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name,
            self.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();

        if full.is_empty() {
            format!("@{}", self.username.as_deref().unwrap_or(""))
        } else {
            full.to_string()
        }
    }
}

/// Private chat with a user.
pub fn user_chat(user_id: UserId) -> ChatId {
    ChatId(user_id.0 as i64)
}

/// Escape special characters for MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];

    let mut result = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
