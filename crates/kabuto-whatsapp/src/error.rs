//! Error types for the WhatsApp adapter.

use thiserror::Error;

/// Errors raised while reading an inbound webhook.
#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// The payload has no `From` field.
    #[error("webhook payload has no sender (From)")]
    MissingSender,
}

/// Result type for WhatsApp operations.
pub type Result<T> = std::result::Result<T, WhatsAppError>;
