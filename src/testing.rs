//! Test doubles shared by handler tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::bot::dispatcher::AppState;
use crate::bot::messenger::{Keyboard, Messenger, TextFormat};
use crate::config::{Settings, SettingsLoader};
use crate::content::ContentStore;
use crate::database::{FlagStore, MemoryFlagStore};
use crate::utils::Profile;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Approve {
        chat_id: ChatId,
        user_id: UserId,
    },
    Text {
        chat_id: ChatId,
        text: String,
        format: TextFormat,
    },
    Photo {
        chat_id: ChatId,
        photo: PathBuf,
        caption: String,
        keyboard: Keyboard,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
}

impl Outbound {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Approve { chat_id, .. }
            | Self::Text { chat_id, .. }
            | Self::Photo { chat_id, .. }
            | Self::Delete { chat_id, .. } => *chat_id,
        }
    }
}

/// [`Messenger`] that records every call instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Outbound>>,
    failing: Mutex<Vec<ChatId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call targeting `chat_id` fail.
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing.lock().push(chat_id);
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Outbound> {
        self.sent()
            .into_iter()
            .filter(|o| o.chat_id() == chat_id)
            .collect()
    }

    fn record(&self, outbound: Outbound) -> Result<()> {
        if self.failing.lock().contains(&outbound.chat_id()) {
            bail!("chat {} is unreachable", outbound.chat_id());
        }
        self.sent.lock().push(outbound);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.record(Outbound::Approve { chat_id, user_id })
    }

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<()> {
        self.record(Outbound::Text {
            chat_id,
            text: text.to_string(),
            format,
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.record(Outbound::Photo {
            chat_id,
            photo: photo.to_path_buf(),
            caption: caption.to_string(),
            keyboard,
        })
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.record(Outbound::Delete {
            chat_id,
            message_id,
        })
    }
}

pub const ADMIN: u64 = 1000;
pub const REPORTS: i64 = -100_200;

pub const CONTENT: &str = r#"{
    "welcome": ", добро пожаловать!",
    "warmup": "*Warm up*",
    "about": "*About us*",
    "faraway": "Жаль, что вы ушли"
}"#;

/// Application state wired to in-memory doubles.
pub struct Harness {
    pub state: AppState,
    pub messenger: Arc<RecordingMessenger>,
    pub queue: Arc<MemoryFlagStore>,
    pub welcome_sent: Arc<MemoryFlagStore>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(20))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self::build(delay, CONTENT)
    }

    pub fn with_content(content: &str) -> Self {
        Self::build(Duration::from_millis(20), content)
    }

    fn build(delay: Duration, content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let content_path = dir.path().join("db.json");
        std::fs::write(&content_path, content).unwrap();

        let settings = Settings {
            admin: Some(ChatId(ADMIN as i64)),
            reports: Some(ChatId(REPORTS)),
            senders: vec![UserId(ADMIN), UserId(2000)],
            strategy_url: Some("https://example.com/strategy".parse().unwrap()),
            reviews_url: Some("https://example.com/reviews".parse().unwrap()),
        };

        let messenger = Arc::new(RecordingMessenger::new());
        let queue = Arc::new(MemoryFlagStore::new());
        let welcome_sent = Arc::new(MemoryFlagStore::new());

        let state = AppState::new(
            messenger.clone(),
            Arc::new(SettingsLoader::preloaded(settings)),
            Arc::new(ContentStore::new(&content_path)),
            queue.clone(),
            welcome_sent.clone(),
            PathBuf::from("img"),
            delay,
        );

        Self {
            state,
            messenger,
            queue,
            welcome_sent,
            _dir: dir,
        }
    }

    /// Wait until `key` shows up in the queue.
    pub async fn wait_queued(&self, key: &str) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !self.queue.contains(key).await.unwrap() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("user was never queued");
    }
}

pub fn profile(id: u64, first_name: &str) -> Profile {
    Profile {
        id: UserId(id),
        first_name: first_name.to_string(),
        last_name: None,
        username: None,
    }
}
