//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use kabuto_core::{AntiSpamFilter, Config, OpenAiClient, RateLimitStore, Relay};
use kabuto_telegram::{Bot, TelegramAdapter, TelegramSender};
use kabuto_whatsapp::{SignatureValidator, TwilioSender, WhatsAppAdapter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Telegram channel adapter.
    pub telegram: Arc<TelegramAdapter>,
    /// WhatsApp channel adapter.
    pub whatsapp: Arc<WhatsAppAdapter>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`, if configured.
    pub telegram_secret: Option<Arc<str>>,
    /// Checks `X-Twilio-Signature`, if validation is enabled.
    pub twilio_validator: Option<Arc<SignatureValidator>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates state from ready-made adapters.
    pub fn new(telegram: TelegramAdapter, whatsapp: WhatsAppAdapter) -> Self {
        Self {
            telegram: Arc::new(telegram),
            whatsapp: Arc::new(whatsapp),
            telegram_secret: None,
            twilio_validator: None,
            start_time: Instant::now(),
        }
    }

    /// Requires the given secret on Telegram webhook calls.
    pub fn with_telegram_secret(mut self, secret: Option<String>) -> Self {
        self.telegram_secret = secret.map(Arc::from);
        self
    }

    /// Requires valid Twilio signatures on WhatsApp webhook calls.
    pub fn with_twilio_validator(mut self, validator: Option<SignatureValidator>) -> Self {
        self.twilio_validator = validator.map(Arc::new);
        self
    }

    /// Wires the production pipeline: one relay and one rate-limit store
    /// shared by both channels.
    pub fn from_config(config: &Config, bot: Bot, bot_username: &str) -> kabuto_core::Result<Self> {
        let filter = AntiSpamFilter::new(
            RateLimitStore::new(),
            config.spam.max_messages,
            config.spam.window,
        );
        let completion = Arc::new(OpenAiClient::new(config.completion.clone())?);
        let relay =
            Arc::new(Relay::new(filter, completion).with_throttle_notice(config.spam.notify));

        let telegram = TelegramAdapter::new(Arc::clone(&relay), Arc::new(TelegramSender::new(bot)))
            .with_bot_username(bot_username);
        let whatsapp = WhatsAppAdapter::new(
            relay,
            Arc::new(TwilioSender::new(config.whatsapp.clone())?),
        );

        Ok(Self::new(telegram, whatsapp)
            .with_telegram_secret(config.telegram.webhook_secret.clone())
            .with_twilio_validator(SignatureValidator::from_config(&config.whatsapp)))
    }

    /// Returns the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
