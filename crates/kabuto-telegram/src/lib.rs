//! Telegram channel adapter for Kabuto.
//!
//! Receives updates (webhook or long-poll), feeds text messages through the
//! relay and answers with `sendMessage`.
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//!
//! Everything else that is text goes to the language model.

pub mod adapter;
pub mod bot;
pub mod commands;
pub mod error;
pub mod sender;

pub use adapter::TelegramAdapter;
pub use bot::{create_bot, get_username, register_webhook, run_polling};
pub use commands::Command;
pub use error::{Result, TelegramError};
pub use sender::TelegramSender;

/// Re-exported so the HTTP layer can build the bot and deserialize webhook bodies.
pub use teloxide::{types::Update, Bot};
