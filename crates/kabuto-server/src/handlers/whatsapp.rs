//! WhatsApp (Twilio) webhook handler.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, Uri},
    response::IntoResponse,
    Form,
};
use kabuto_whatsapp::{
    TwilioWebhook, WhatsAppAdapter, EMPTY_TWIML, SIGNATURE_HEADER, TWIML_CONTENT_TYPE,
};
use tracing::warn;

use crate::error::{Result, WebhookError};
use crate::state::AppState;

/// POST /webhook/whatsapp - Receive a Twilio inbound message.
///
/// Answers with empty TwiML; the reply goes out through the Messages API
/// once the model has answered.
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse> {
    if let Some(validator) = state.twilio_validator.as_deref() {
        let url = validator
            .webhook_url()
            .map(str::to_string)
            .unwrap_or_else(|| request_url(&headers, &uri));
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !validator.verify(&url, &params, signature) {
            warn!(url = %url, "Twilio webhook call with bad signature");
            return Err(WebhookError::Unauthorized(
                "invalid Twilio signature".to_string(),
            ));
        }
    }

    let message = WhatsAppAdapter::parse_webhook(&TwilioWebhook::from_params(&params))?;

    let adapter = Arc::clone(&state.whatsapp);
    tokio::spawn(async move {
        adapter.handle_message(&message).await;
    });

    Ok(([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], EMPTY_TWIML))
}

/// Rebuilds the URL Twilio called from `Host` and `X-Forwarded-Proto`.
///
/// Twilio only calls HTTPS endpoints, so the scheme defaults to `https`.
pub fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let proto = header_value("x-forwarded-proto").unwrap_or("https");
    let host = header_value("x-forwarded-host")
        .or_else(|| header_value(header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();
    let path = uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{}://{}{}", proto, host, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_url_from_proxy_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("kabuto.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        let uri: Uri = "/webhook/whatsapp?tenant=1".parse().unwrap();

        assert_eq!(
            request_url(&headers, &uri),
            "https://kabuto.example/webhook/whatsapp?tenant=1"
        );
    }

    #[test]
    fn test_request_url_defaults_to_https() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("kabuto.example"));
        let uri: Uri = "/webhook/whatsapp".parse().unwrap();

        assert_eq!(
            request_url(&headers, &uri),
            "https://kabuto.example/webhook/whatsapp"
        );
    }
}
