//! Kabuto Core - the relay pipeline shared by every channel.
//!
//! - **config**: typed configuration loaded once from the environment
//! - **models**: inbound messages and outbound replies
//! - **spam**: per-sender fixed-window anti-spam filter
//! - **completion**: language-model client (OpenAI chat completions)
//! - **relay**: filter → completion → send pipeline
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kabuto_core::{AntiSpamFilter, Config, OpenAiClient, Relay, RateLimitStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let filter = AntiSpamFilter::new(
//!     RateLimitStore::new(),
//!     config.spam.max_messages,
//!     config.spam.window,
//! );
//! let completion = Arc::new(OpenAiClient::new(config.completion.clone())?);
//! let relay = Relay::new(filter, completion).with_throttle_notice(config.spam.notify);
//! # let _ = relay;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod spam;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use completion::{CompletionClient, OpenAiClient};
pub use config::{
    CompletionConfig, Config, ServerConfig, SpamConfig, TelegramConfig, WhatsAppConfig,
};
pub use error::{ApiError, ConfigError, Result};
pub use models::{Channel, IncomingMessage, OutgoingReply};
pub use relay::{Relay, RelayOutcome, ReplySender, BLANK_MESSAGE_REPLY, THROTTLE_NOTICE};
pub use spam::{AntiSpamFilter, RateLimitEntry, RateLimitStore, SpamDecision};
