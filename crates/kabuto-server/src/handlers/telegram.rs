//! Telegram webhook handler.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use kabuto_telegram::Update;
use tracing::warn;

use crate::error::{Result, WebhookError};
use crate::state::AppState;

/// Header Telegram uses to echo the secret given at `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// POST /webhook/telegram - Receive a Telegram update.
///
/// Acknowledges immediately; the message is relayed on a background task so
/// Telegram never waits on the language model.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<&'static str> {
    if let Some(expected) = state.telegram_secret.as_deref() {
        let given = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!(update_id = update.id.0, "Telegram webhook call with bad secret");
            return Err(WebhookError::Unauthorized(
                "invalid webhook secret".to_string(),
            ));
        }
    }

    let adapter = Arc::clone(&state.telegram);
    tokio::spawn(async move {
        adapter.handle_update(&update).await;
    });

    Ok("ok")
}
