//! Command plugins.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod broadcast;
pub mod restart;
pub mod start;

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::debug;

/// All bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Начать")]
    Start(String),

    #[command(rename = "sendMessage", description = "Разослать сообщение всем")]
    SendMessage(String),

    #[command(description = "Перезапустить бота")]
    Restart,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_handler))
        .branch(case![Command::SendMessage(args)].endpoint(broadcast::send_message_command))
        .branch(case![Command::Restart].endpoint(restart::restart_command))
}

/// Build the handler for presses of the "СТАРТ" reply button.
pub fn start_text_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.text().is_some_and(start::is_start_text))
        .endpoint(start::start_handler)
}

/// Catch-all for messages no other branch wants.
pub async fn ignore_message(msg: Message) -> Result<()> {
    debug!(
        "Ignoring message {} in chat {}",
        msg.id.0, msg.chat.id
    );
    Ok(())
}
