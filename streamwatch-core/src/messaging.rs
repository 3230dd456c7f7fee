//! Delivery of announcement texts to chats.

use async_trait::async_trait;
use std::time::Duration;
use streamwatch_sdk::client::{ClientError, TelegramClient};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("send failed: {0}")]
    Client(#[from] ClientError),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("recipient rejected the message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// [`Messenger`] backed by the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    client: TelegramClient,
    timeout: Duration,
}

impl TelegramMessenger {
    pub fn new(client: TelegramClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let result = tokio::time::timeout(self.timeout, self.client.send_message(chat_id, text))
            .await
            .map_err(|_| DeliveryError::Timeout(self.timeout))?;
        match result {
            Ok(message_id) => {
                tracing::debug!(chat_id, message_id, "Message delivered");
                Ok(())
            }
            Err(ClientError::Telegram { description, .. }) => {
                Err(DeliveryError::Rejected(description))
            }
            Err(e) => Err(e.into()),
        }
    }
}
