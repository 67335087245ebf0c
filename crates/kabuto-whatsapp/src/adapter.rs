//! Inbound Twilio webhooks to relay calls.

use std::sync::Arc;

use tracing::info;

use kabuto_core::{Channel, IncomingMessage, Relay, RelayOutcome, ReplySender};

use crate::error::{Result, WhatsAppError};

/// Reply when a message arrives without a body (media only, empty).
pub const NOTHING_RECEIVED_REPLY: &str = "Ich habe nichts empfangen.";

/// Form fields Twilio posts for an inbound WhatsApp message.
///
/// Only the fields the relay reads are listed; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwilioWebhook {
    /// Sender address, e.g. `whatsapp:+491701234567`.
    pub from: Option<String>,
    /// Our number.
    pub to: Option<String>,
    /// Message text.
    pub body: Option<String>,
    pub message_sid: Option<String>,
    /// WhatsApp display name of the sender.
    pub profile_name: Option<String>,
    pub num_media: Option<String>,
}

impl TwilioWebhook {
    /// Picks the known fields out of the decoded form parameters.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let field = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };
        Self {
            from: field("From"),
            to: field("To"),
            body: field("Body"),
            message_sid: field("MessageSid"),
            profile_name: field("ProfileName"),
            num_media: field("NumMedia"),
        }
    }
}

/// WhatsApp channel adapter.
pub struct WhatsAppAdapter {
    relay: Arc<Relay>,
    sender: Arc<dyn ReplySender>,
}

impl WhatsAppAdapter {
    /// Creates an adapter routing messages through `relay` and replying with `sender`.
    pub fn new(relay: Arc<Relay>, sender: Arc<dyn ReplySender>) -> Self {
        Self { relay, sender }
    }

    /// Turns a webhook payload into a message; fails without a sender.
    pub fn parse_webhook(form: &TwilioWebhook) -> Result<IncomingMessage> {
        let sender_id = form
            .from
            .as_deref()
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .ok_or(WhatsAppError::MissingSender)?;

        Ok(IncomingMessage::new(
            Channel::WhatsApp,
            sender_id,
            form.body.clone().unwrap_or_default(),
        ))
    }

    /// Relays one parsed message.
    pub async fn handle_message(&self, message: &IncomingMessage) -> RelayOutcome {
        info!(sender_id = %message.sender_id, "WhatsApp message received");

        if message.is_blank() {
            return self
                .relay
                .reply_fixed(message, NOTHING_RECEIVED_REPLY, self.sender.as_ref())
                .await;
        }
        self.relay.handle(message, self.sender.as_ref()).await
    }
}
