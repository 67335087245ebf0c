//! Outbound replies through the Telegram `sendMessage` method.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::RequestError;

use kabuto_core::{ApiError, OutgoingReply, ReplySender};

/// Sends replies with a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Creates a sender for `bot`.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send_reply(&self, reply: &OutgoingReply) -> kabuto_core::Result<()> {
        let chat_id: i64 = reply
            .recipient_id
            .parse()
            .map_err(|_| ApiError::Rejected(format!("invalid chat id: {}", reply.recipient_id)))?;

        self.bot
            .send_message(ChatId(chat_id), reply.text.clone())
            .await
            .map_err(api_error)?;
        Ok(())
    }
}

/// Maps a teloxide request error onto the relay's error classification.
pub fn api_error(err: RequestError) -> ApiError {
    match &err {
        RequestError::Network(e) if e.is_timeout() => ApiError::Timeout(err.to_string()),
        RequestError::Network(_) | RequestError::Io(_) => ApiError::Network(err.to_string()),
        RequestError::RetryAfter(_) => ApiError::Status {
            status: 429,
            body: err.to_string(),
        },
        RequestError::Api(_) | RequestError::MigrateToChatId(_) => {
            ApiError::Rejected(err.to_string())
        }
        _ => ApiError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kabuto_core::{Channel, IncomingMessage};

    #[tokio::test]
    async fn test_non_numeric_recipient_rejected_without_request() {
        let sender = TelegramSender::new(Bot::new("123456:TEST"));
        let msg = IncomingMessage::new(Channel::Telegram, "u1", "hello");
        let reply = OutgoingReply::to(&msg, "hi");

        let err = sender.send_reply(&reply).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
        assert!(!err.is_retryable());
    }
}
