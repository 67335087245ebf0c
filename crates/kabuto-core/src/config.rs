//! Typed configuration, loaded once at startup.
//!
//! Every component receives its section of [`Config`] through its
//! constructor; nothing reads the environment after [`Config::from_env`].
//!
//! # Environment Variables
//!
//! Required:
//! - `OPENAI_API_KEY`
//! - `TELEGRAM_API_TOKEN`
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_WHATSAPP_NUMBER`
//!
//! Optional:
//! - `HOST` (default `0.0.0.0`), `PORT` (default `8080`)
//! - `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
//!   `OPENAI_MAX_TOKENS`, `OPENAI_TIMEOUT_SECS`, `SYSTEM_PROMPT`
//! - `TELEGRAM_WEBHOOK_URL_BASE` (or `RENDER_EXTERNAL_URL`),
//!   `TELEGRAM_WEBHOOK_SECRET`
//! - `TWILIO_API_BASE`, `TWILIO_WEBHOOK_URL`, `TWILIO_VALIDATE_SIGNATURE`
//! - `SPAM_MAX_MESSAGES`, `SPAM_WINDOW_SECS`, `SPAM_NOTIFY`

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::spam::{DEFAULT_MAX_MESSAGES, DEFAULT_WINDOW};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const TELEGRAM_API_TOKEN_ENV: &str = "TELEGRAM_API_TOKEN";
pub const TWILIO_ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
pub const TWILIO_WHATSAPP_NUMBER_ENV: &str = "TWILIO_WHATSAPP_NUMBER";

/// Default OpenAI API base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Twilio REST API base.
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// System prompt used when `SYSTEM_PROMPT` is not set.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are KabutoAI, a professional multilingual assistant. \
Always respond in the user's language (German or English). \
Be concise, friendly, and practical. Use short paragraphs and lists when helpful.";

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub telegram: TelegramConfig,
    pub whatsapp: WhatsAppConfig,
    pub spam: SpamConfig,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let server = ServerConfig {
            host: env.optional("HOST").unwrap_or_else(|| ServerConfig::default().host),
            port: env.parse("PORT", DEFAULT_PORT)?,
        };

        let completion = CompletionConfig {
            api_key: env.required(OPENAI_API_KEY_ENV)?,
            base_url: env.url("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)?,
            model: env.optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: env.parse("OPENAI_TEMPERATURE", 0.4_f32)?,
            max_tokens: env.parse("OPENAI_MAX_TOKENS", 500_u32)?,
            timeout: Duration::from_secs(env.parse("OPENAI_TIMEOUT_SECS", 30_u64)?),
            system_prompt: env
                .optional("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            retry_on_network: true,
        };

        let webhook_base = match env.optional("TELEGRAM_WEBHOOK_URL_BASE") {
            Some(base) => Some(("TELEGRAM_WEBHOOK_URL_BASE", base)),
            None => env
                .optional("RENDER_EXTERNAL_URL")
                .map(|base| ("RENDER_EXTERNAL_URL", base)),
        };
        let webhook_base_url = webhook_base
            .map(|(name, base)| parse_url(name, &base))
            .transpose()?;

        let twilio_webhook_url = match env.optional("TWILIO_WEBHOOK_URL") {
            Some(raw) => Some(parse_url("TWILIO_WEBHOOK_URL", &raw)?),
            None => webhook_base_url
                .as_ref()
                .and_then(|base| join_path(base, "/webhook/whatsapp")),
        };

        let telegram = TelegramConfig {
            token: env.required(TELEGRAM_API_TOKEN_ENV)?,
            webhook_base_url,
            webhook_secret: env.optional("TELEGRAM_WEBHOOK_SECRET"),
        };

        let whatsapp = WhatsAppConfig {
            account_sid: env.required(TWILIO_ACCOUNT_SID_ENV)?,
            auth_token: env.required(TWILIO_AUTH_TOKEN_ENV)?,
            from_number: env.required(TWILIO_WHATSAPP_NUMBER_ENV)?,
            api_base: env.url("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE)?,
            webhook_url: twilio_webhook_url,
            validate_signature: env.parse("TWILIO_VALIDATE_SIGNATURE", true)?,
        };

        let spam = SpamConfig {
            max_messages: env.parse("SPAM_MAX_MESSAGES", DEFAULT_MAX_MESSAGES)?,
            window: Duration::from_secs(env.parse("SPAM_WINDOW_SECS", DEFAULT_WINDOW.as_secs())?),
            notify: env.parse("SPAM_NOTIFY", true)?,
        };

        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(invalid("OPENAI_TEMPERATURE", "must be between 0 and 2"));
        }
        if completion.timeout.is_zero() {
            return Err(invalid("OPENAI_TIMEOUT_SECS", "must be at least 1"));
        }
        if spam.max_messages == 0 {
            return Err(invalid("SPAM_MAX_MESSAGES", "must be at least 1"));
        }
        if spam.window.is_zero() {
            return Err(invalid("SPAM_WINDOW_SECS", "must be at least 1"));
        }

        Ok(Self {
            server,
            completion,
            telegram,
            whatsapp,
            spam,
        })
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Overrides the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Language-model API settings. Fixed for the process lifetime.
#[derive(Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request timeout of the HTTP client.
    pub timeout: Duration,
    pub system_prompt: String,
    /// Retry once, immediately, when the request fails below HTTP.
    pub retry_on_network: bool,
}

impl CompletionConfig {
    /// Creates a configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.4,
            max_tokens: 500,
            timeout: Duration::from_secs(30),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            retry_on_network: true,
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the network retry.
    pub fn with_retry_on_network(mut self, retry: bool) -> Self {
        self.retry_on_network = retry;
        self
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("retry_on_network", &self.retry_on_network)
            .finish()
    }
}

/// Telegram Bot API settings.
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    /// Public base URL the webhook is registered under, if any.
    pub webhook_base_url: Option<Url>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value.
    pub webhook_secret: Option<String>,
}

impl TelegramConfig {
    /// Full webhook URL (`{base}/webhook/telegram`), if a base is configured.
    pub fn webhook_url(&self) -> Option<Url> {
        join_path(self.webhook_base_url.as_ref()?, "/webhook/telegram")
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &mask_secret(&self.token))
            .field("webhook_base_url", &self.webhook_base_url.as_ref().map(Url::as_str))
            .field("webhook_secret", &self.webhook_secret.as_deref().map(mask_secret))
            .finish()
    }
}

/// Twilio WhatsApp gateway settings.
#[derive(Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, with or without the `whatsapp:` prefix.
    pub from_number: String,
    /// REST API base without trailing slash.
    pub api_base: String,
    /// Public URL Twilio posts inbound messages to. Signatures are computed
    /// over it; when unset the URL is rebuilt from the request.
    pub webhook_url: Option<Url>,
    /// Reject inbound webhooks without a valid `X-Twilio-Signature`.
    pub validate_signature: bool,
}

impl fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &mask_secret(&self.auth_token))
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .field("webhook_url", &self.webhook_url.as_ref().map(Url::as_str))
            .field("validate_signature", &self.validate_signature)
            .finish()
    }
}

/// Anti-spam settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamConfig {
    pub max_messages: u32,
    pub window: Duration,
    /// Send a notice on the first blocked message of a window.
    pub notify: bool,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            window: DEFAULT_WINDOW,
            notify: true,
        }
    }
}

/// Masks a secret for logs, keeping the first and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                message: format!("{:?}: {}", raw, e),
            }),
            None => Ok(default),
        }
    }

    fn url(&self, name: &'static str, default: &str) -> Result<String, ConfigError> {
        let raw = self.optional(name).unwrap_or_else(|| default.to_string());
        parse_url(name, &raw)?;
        Ok(raw.trim_end_matches('/').to_string())
    }
}

fn join_path(base: &Url, path: &str) -> Option<Url> {
    let trimmed = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{}{}", trimmed, path)).ok()
}

fn invalid(name: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        message: message.to_string(),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        message: format!("{:?}: {}", raw, e),
    })
}
