//! Outbound Telegram calls.
//!
//! Handlers talk to Telegram only through [`Messenger`] so they can be driven
//! by a recording double in tests. [`TelegramMessenger`] is the real thing.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, MessageId, ParseMode, ReplyMarkup, UserId,
};
use url::Url;

use super::dispatcher::ThrottledBot;

/// Inline button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub text: String,
    pub url: Url,
}

impl LinkButton {
    pub fn new(text: impl Into<String>, url: Url) -> Self {
        Self {
            text: text.into(),
            url,
        }
    }
}

/// Keyboard attached to a photo message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Single-use, resized reply keyboard with one button.
    Reply { label: String },
    /// One row of URL buttons.
    Links(Vec<LinkButton>),
}

impl From<Keyboard> for ReplyMarkup {
    fn from(keyboard: Keyboard) -> Self {
        match keyboard {
            Keyboard::Reply { label } => ReplyMarkup::Keyboard(
                KeyboardMarkup::new(vec![vec![KeyboardButton::new(label)]])
                    .one_time_keyboard()
                    .resize_keyboard(),
            ),
            Keyboard::Links(buttons) => {
                let row = buttons
                    .into_iter()
                    .map(|b| InlineKeyboardButton::url(b.text, b.url))
                    .collect::<Vec<_>>();
                ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(vec![row]))
            }
        }
    }
}

/// How a text body should be parsed by Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

/// Outbound operations used by the handlers.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> Result<()>;

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<()>;

    /// Upload a local photo with a MarkdownV2 caption and a keyboard.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;
}

/// [`Messenger`] backed by the throttled teloxide bot.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: ThrottledBot,
}

impl TelegramMessenger {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.bot.approve_chat_join_request(chat_id, user_id).await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<()> {
        let request = self.bot.send_message(chat_id, text);
        match format {
            TextFormat::Plain => request.await?,
            TextFormat::Markdown => request.parse_mode(ParseMode::MarkdownV2).await?,
        };
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.bot
            .send_photo(chat_id, InputFile::file(PathBuf::from(photo)))
            .caption(caption)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(ReplyMarkup::from(keyboard))
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }
}
