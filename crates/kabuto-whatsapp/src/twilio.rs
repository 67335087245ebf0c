//! Twilio Messages API client for outbound WhatsApp replies.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use kabuto_core::{ApiError, OutgoingReply, ReplySender, WhatsAppConfig};

/// Address scheme Twilio uses for WhatsApp numbers.
const WHATSAPP_SCHEME: &str = "whatsapp:";

/// Request timeout for the Messages API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends WhatsApp messages through Twilio.
#[derive(Clone)]
pub struct TwilioSender {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl TwilioSender {
    /// Creates a sender authenticating with the configured account SID and token.
    pub fn new(config: WhatsAppConfig) -> kabuto_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Messages resource for the configured account.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base, self.config.account_sid
        )
    }
}

#[async_trait]
impl ReplySender for TwilioSender {
    async fn send_reply(&self, reply: &OutgoingReply) -> kabuto_core::Result<()> {
        let params = [
            ("From", whatsapp_address(&self.config.from_number)),
            ("To", whatsapp_address(&reply.recipient_id)),
            ("Body", reply.text.clone()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %reply.recipient_id, "Twilio accepted message");
        Ok(())
    }
}

/// Prefixes `number` with `whatsapp:` unless it already carries it.
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with(WHATSAPP_SCHEME) {
        number.to_string()
    } else {
        format!("{}{}", WHATSAPP_SCHEME, number)
    }
}
