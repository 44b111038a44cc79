//! Inbound message dispatch and reply delivery

use crate::commands::Command;
use crate::handlers::{handle_command, CommandContext, Reply};
use crate::messages;
use crate::state::AppState;
use crate::transport::telegram::Update;
use crate::transport::{Transport, TransportResult};
use crate::types::ChatUser;
use std::sync::Arc;
use std::time::Duration;

/// A text message received from a chat
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub sender: Option<ChatUser>,
    pub text: String,
}

impl IncomingMessage {
    /// Extract the text message from an update, if there is one
    pub fn from_update(update: Update) -> Option<Self> {
        let message = update.message?;
        let text = message.text?;
        Some(Self {
            chat_id: message.chat.id,
            sender: message.from.map(ChatUser::from),
            text,
        })
    }
}

/// Settings shared by every dispatched message
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Our own username, to ignore `/command@otherbot`
    pub bot_username: Option<String>,
    pub announce_delay: Duration,
}

/// Parse, handle and answer one incoming message. Non-commands are ignored.
pub async fn dispatch_message(
    message: IncomingMessage,
    state: &Arc<AppState>,
    transport: &dyn Transport,
    options: &DispatchOptions,
) {
    let Some(parsed) = Command::parse(&message.text, options.bot_username.as_deref()) else {
        return;
    };

    let reply = match parsed {
        Ok(command) => {
            tracing::info!(
                chat_id = message.chat_id,
                command = command.name(),
                "Handling command"
            );
            let ctx = CommandContext {
                chat_id: message.chat_id,
                sender: message.sender,
                today: chrono::Local::now().date_naive(),
            };

            let _gate = state.lock_commands().await;
            handle_command(command, &ctx, state, transport).await
        }
        Err(usage) => Reply::Text(messages::usage(usage.usage)),
    };

    if let Err(e) = deliver(transport, message.chat_id, reply, options.announce_delay).await {
        tracing::error!(chat_id = message.chat_id, "Failed to deliver reply: {}", e);
    }
}

/// Send a reply. Announcements go out as two messages with `pause` in between.
pub async fn deliver(
    transport: &dyn Transport,
    chat_id: i64,
    reply: Reply,
    pause: Duration,
) -> TransportResult<()> {
    match reply {
        Reply::Text(text) => transport.send_message(chat_id, &text).await,
        Reply::Announcement { teaser, verdict } => {
            transport.send_message(chat_id, &teaser).await?;
            tokio::time::sleep(pause).await;
            transport.send_message(chat_id, &verdict).await
        }
    }
}
