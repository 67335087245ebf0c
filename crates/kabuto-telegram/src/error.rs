//! Error types for the Telegram adapter.

use thiserror::Error;

/// Errors that can occur while setting up the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Failed to reach the Bot API or authenticate.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Webhook registration or removal failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
