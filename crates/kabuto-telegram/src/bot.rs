//! Bot API setup: identity check, webhook registration, long-poll mode.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info, warn};

use kabuto_core::TelegramConfig;

use crate::adapter::TelegramAdapter;
use crate::error::{Result, TelegramError};

/// Creates the teloxide bot from configuration.
pub fn create_bot(config: &TelegramConfig) -> Bot {
    Bot::new(config.token.clone())
}

/// Get the bot's username.
pub async fn get_username(bot: &Bot) -> Result<String> {
    let me = bot
        .get_me()
        .await
        .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
    Ok(me.username().to_string())
}

/// Registers `{base}/webhook/telegram` with Telegram.
///
/// Returns `Ok(false)` without calling the API when no public base URL is
/// configured.
pub async fn register_webhook(bot: &Bot, config: &TelegramConfig) -> Result<bool> {
    let Some(url) = config.webhook_url() else {
        warn!("No public base URL configured, Telegram webhook not registered");
        return Ok(false);
    };

    let mut request = bot.set_webhook(url.clone());
    if let Some(secret) = &config.webhook_secret {
        request = request.secret_token(secret.clone());
    }
    request
        .await
        .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;

    info!(url = %url, "Telegram webhook registered");
    Ok(true)
}

/// Runs the bot in long-poll mode until Ctrl+C.
///
/// Any registered webhook is removed first, since Telegram refuses
/// `getUpdates` while one is set.
pub async fn run_polling(bot: Bot, adapter: Arc<TelegramAdapter>) -> Result<()> {
    info!("Starting Telegram bot in polling mode...");

    bot.delete_webhook()
        .await
        .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;

    let handler = Update::filter_message().endpoint(move |msg: Message| {
        let adapter = Arc::clone(&adapter);
        async move {
            adapter.handle_message(&msg).await;
            respond(())
        }
    });

    Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Polling stopped");
    Ok(())
}
