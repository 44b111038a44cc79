pub mod telegram;

use crate::types::ChatUser;
use async_trait::async_trait;
use std::time::Duration;

pub use telegram::TelegramClient;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors talking to the messaging platform
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({code:?}): {description}")]
    Api {
        code: Option<i32>,
        description: String,
    },

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// Outbound side of the messaging platform used by command handlers
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a plain-text message to a chat
    async fn send_message(&self, chat_id: i64, text: &str) -> TransportResult<()>;

    /// List a chat's administrators. Usually requires the bot to be an admin itself.
    async fn get_chat_administrators(&self, chat_id: i64) -> TransportResult<Vec<ChatUser>>;

    /// Name of this transport, for logs
    fn name(&self) -> &str;
}
