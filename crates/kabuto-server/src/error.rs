//! HTTP-facing error type for the webhook routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for webhook handlers.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Webhook error with a consistent JSON body.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or wrong webhook secret.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Payload is missing something we need.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl WebhookError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WebhookError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

impl From<kabuto_whatsapp::WhatsAppError> for WebhookError {
    fn from(err: kabuto_whatsapp::WhatsAppError) -> Self {
        WebhookError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebhookError::Unauthorized("secret".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::BadRequest("From".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_from_whatsapp_error() {
        let err: WebhookError = kabuto_whatsapp::WhatsAppError::MissingSender.into();
        assert_eq!(
            err.to_string(),
            "bad request: webhook payload has no sender (From)"
        );
    }
}
