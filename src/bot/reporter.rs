//! Error reporting to the admin peer.
//!
//! Every handler error ends up here: it is logged and, when an admin is
//! configured, forwarded to them as a plain text message.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::error_handlers::ErrorHandler;
use tracing::{error, warn};

use super::messenger::{Messenger, TextFormat};
use crate::config::SettingsLoader;

/// Logs errors and forwards them to the configured admin.
#[derive(Clone)]
pub struct ErrorReporter {
    messenger: Arc<dyn Messenger>,
    settings: Arc<SettingsLoader>,
}

impl ErrorReporter {
    pub fn new(messenger: Arc<dyn Messenger>, settings: Arc<SettingsLoader>) -> Self {
        Self {
            messenger,
            settings,
        }
    }

    pub async fn report(&self, err: &anyhow::Error) {
        error!("Handler error: {:#}", err);

        let Some(admin) = self.settings.get().admin else {
            return;
        };

        let text = format!("⚠️ {:#}", err);
        if let Err(e) = self.messenger.send_text(admin, &text, TextFormat::Plain).await {
            warn!("Failed to report error to admin {}: {:#}", admin, e);
        }
    }
}

impl ErrorHandler<anyhow::Error> for ErrorReporter {
    fn handle_error(self: Arc<Self>, error: anyhow::Error) -> BoxFuture<'static, ()> {
        async move { self.report(&error).await }.boxed()
    }
}
