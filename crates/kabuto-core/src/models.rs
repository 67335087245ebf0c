//! Message types flowing through the relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker appended when a reply is cut to fit a channel.
const TRUNCATION_MARKER: &str = "…";

/// A messaging platform the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Telegram Bot API.
    Telegram,
    /// WhatsApp through the Twilio gateway.
    WhatsApp,
}

impl Channel {
    /// Maximum length of a single outbound message, in [`Channel::text_len`] units.
    pub fn max_message_len(&self) -> usize {
        match self {
            Channel::Telegram => 4096,
            Channel::WhatsApp => 1600,
        }
    }

    /// Length of `text` as the channel counts it.
    ///
    /// Telegram counts UTF-16 code units; Twilio counts characters.
    pub fn text_len(&self, text: &str) -> usize {
        match self {
            Channel::Telegram => text.encode_utf16().count(),
            Channel::WhatsApp => text.chars().count(),
        }
    }

    fn char_len(&self, c: char) -> usize {
        match self {
            Channel::Telegram => c.len_utf16(),
            Channel::WhatsApp => 1,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Telegram => write!(f, "telegram"),
            Channel::WhatsApp => write!(f, "whatsapp"),
        }
    }
}

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Channel the message arrived on.
    pub channel: Channel,
    /// Sender identity (Telegram chat id, WhatsApp address).
    pub sender_id: String,
    /// Message text as sent by the user.
    pub text: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    /// Creates a message stamped with the current time.
    pub fn new(channel: Channel, sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel,
            sender_id: sender_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Overrides the timestamp (e.g. with the platform's own send date).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns true if the text carries nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A reply addressed to the sender of an [`IncomingMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    /// Channel to send on.
    pub channel: Channel,
    /// Recipient identity, same format as `IncomingMessage::sender_id`.
    pub recipient_id: String,
    /// Reply text, already fitted to the channel limit.
    pub text: String,
}

impl OutgoingReply {
    /// Creates a reply to `message`, truncating `text` to the channel limit.
    pub fn to(message: &IncomingMessage, text: impl Into<String>) -> Self {
        let text = fit_to_limit(message.channel, text.into());
        Self {
            channel: message.channel,
            recipient_id: message.sender_id.clone(),
            text,
        }
    }
}

fn fit_to_limit(channel: Channel, text: String) -> String {
    let limit = channel.max_message_len();
    if channel.text_len(&text) <= limit {
        return text;
    }

    let budget = limit.saturating_sub(channel.text_len(TRUNCATION_MARKER));
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        used += channel.char_len(c);
        if used > budget {
            break;
        }
        truncated.push(c);
    }
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
