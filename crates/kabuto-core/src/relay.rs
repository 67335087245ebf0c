//! The message pipeline: filter, complete, send.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::completion::CompletionClient;
use crate::error::Result;
use crate::models::{IncomingMessage, OutgoingReply};
use crate::spam::{AntiSpamFilter, SpamDecision};

/// Sent once per window to a sender who hit the rate limit.
pub const THROTTLE_NOTICE: &str =
    "⏳ Zu viele Nachrichten – bitte warte einen Moment, bevor du weiterschreibst.";

/// Sent when a message carries no text.
pub const BLANK_MESSAGE_REPLY: &str = "Sag mir kurz, wobei ich dir helfen soll. 🙂";

/// Delivers replies on one channel.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Sends `reply` through the channel's API.
    async fn send_reply(&self, reply: &OutgoingReply) -> Result<()>;
}

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// A reply was delivered.
    Replied,
    /// The anti-spam filter dropped the message.
    Throttled {
        /// True if the throttle notice was delivered.
        notified: bool,
    },
    /// The completion call failed; nothing was sent.
    CompletionFailed,
    /// A reply was produced but the channel refused or failed to take it.
    SendFailed,
}

/// Routes inbound messages through the anti-spam filter and completion
/// client, and hands the result to the channel's sender.
pub struct Relay {
    filter: AntiSpamFilter,
    completion: Arc<dyn CompletionClient>,
    notify_on_throttle: bool,
}

impl Relay {
    /// Creates a relay that notifies throttled senders.
    pub fn new(filter: AntiSpamFilter, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            filter,
            completion,
            notify_on_throttle: true,
        }
    }

    /// Chooses between notifying throttled senders and dropping silently.
    pub fn with_throttle_notice(mut self, notify: bool) -> Self {
        self.notify_on_throttle = notify;
        self
    }

    /// Returns the anti-spam filter.
    pub fn filter(&self) -> &AntiSpamFilter {
        &self.filter
    }

    /// Runs the full pipeline for `message`.
    pub async fn handle(
        &self,
        message: &IncomingMessage,
        sender: &dyn ReplySender,
    ) -> RelayOutcome {
        if let Some(outcome) = self.admit(message, sender).await {
            return outcome;
        }

        if message.is_blank() {
            return self.deliver(OutgoingReply::to(message, BLANK_MESSAGE_REPLY), sender).await;
        }

        let text = match self.completion.generate_reply(message.text.trim()).await {
            Ok(text) => text,
            Err(e) => {
                error!(
                    channel = %message.channel,
                    sender_id = %message.sender_id,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Completion failed, skipping reply"
                );
                return RelayOutcome::CompletionFailed;
            }
        };

        self.deliver(OutgoingReply::to(message, text), sender).await
    }

    /// Answers `message` with fixed `text`, without calling the model.
    ///
    /// The message still counts against the sender's rate limit.
    pub async fn reply_fixed(
        &self,
        message: &IncomingMessage,
        text: &str,
        sender: &dyn ReplySender,
    ) -> RelayOutcome {
        if let Some(outcome) = self.admit(message, sender).await {
            return outcome;
        }
        self.deliver(OutgoingReply::to(message, text), sender).await
    }

    /// Returns `Some` if the message was stopped by the filter.
    async fn admit(
        &self,
        message: &IncomingMessage,
        sender: &dyn ReplySender,
    ) -> Option<RelayOutcome> {
        let first_in_window = match self.filter.check(&message.sender_id, Instant::now()).await {
            SpamDecision::Allowed => return None,
            SpamDecision::Blocked { first_in_window } => first_in_window,
        };

        info!(
            channel = %message.channel,
            sender_id = %message.sender_id,
            "Message throttled"
        );

        let mut notified = false;
        if self.notify_on_throttle && first_in_window {
            let notice = OutgoingReply::to(message, THROTTLE_NOTICE);
            notified = self.deliver(notice, sender).await == RelayOutcome::Replied;
        }
        Some(RelayOutcome::Throttled { notified })
    }

    async fn deliver(&self, reply: OutgoingReply, sender: &dyn ReplySender) -> RelayOutcome {
        match sender.send_reply(&reply).await {
            Ok(()) => {
                info!(
                    channel = %reply.channel,
                    recipient_id = %reply.recipient_id,
                    "Reply sent"
                );
                RelayOutcome::Replied
            }
            Err(e) => {
                warn!(
                    channel = %reply.channel,
                    recipient_id = %reply.recipient_id,
                    error = %e,
                    "Failed to send reply"
                );
                RelayOutcome::SendFailed
            }
        }
    }
}
