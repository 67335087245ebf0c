//! Inbound Telegram updates to relay calls.

use std::sync::Arc;

use teloxide::types::{Message, Update, UpdateKind};
use tracing::{debug, info};

use kabuto_core::{Channel, IncomingMessage, Relay, RelayOutcome, ReplySender};

use crate::commands::{parse_command, reply_for};

/// Telegram channel adapter.
///
/// Shared between the webhook route and the long-poll dispatcher.
pub struct TelegramAdapter {
    relay: Arc<Relay>,
    sender: Arc<dyn ReplySender>,
    bot_username: String,
}

impl TelegramAdapter {
    /// Creates an adapter routing messages through `relay` and replying with `sender`.
    pub fn new(relay: Arc<Relay>, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            relay,
            sender,
            bot_username: String::new(),
        }
    }

    /// Sets the bot username so `/start@username` parses in groups.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = username.into();
        self
    }

    /// Extracts sender and text from a message; `None` for non-text messages.
    pub fn parse_message(msg: &Message) -> Option<IncomingMessage> {
        let text = msg.text()?;
        Some(
            IncomingMessage::new(Channel::Telegram, msg.chat.id.0.to_string(), text)
                .with_timestamp(msg.date),
        )
    }

    /// Handles one webhook update. Returns `None` if the update was ignored.
    pub async fn handle_update(&self, update: &Update) -> Option<RelayOutcome> {
        match &update.kind {
            UpdateKind::Message(msg) => self.handle_message(msg).await,
            _ => {
                debug!(update_id = update.id.0, "Ignoring non-message update");
                None
            }
        }
    }

    /// Handles one message. Returns `None` if the message carried no text.
    pub async fn handle_message(&self, msg: &Message) -> Option<RelayOutcome> {
        let Some(incoming) = Self::parse_message(msg) else {
            debug!(chat_id = msg.chat.id.0, "Ignoring message without text");
            return None;
        };

        info!(
            channel = %incoming.channel,
            sender_id = %incoming.sender_id,
            user = ?msg.from.as_ref().and_then(|u| u.username.as_ref()),
            "Telegram message received"
        );

        let outcome = match parse_command(incoming.text.trim(), &self.bot_username) {
            Some(command) => {
                let reply = reply_for(&command);
                self.relay.reply_fixed(&incoming, &reply, self.sender.as_ref()).await
            }
            None => self.relay.handle(&incoming, self.sender.as_ref()).await,
        };

        Some(outcome)
    }
}
