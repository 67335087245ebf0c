//! WhatsApp channel adapter for Kabuto, through the Twilio gateway.
//!
//! Twilio posts each inbound message as a form to our webhook. The webhook
//! acknowledges with an empty TwiML document and the reply is delivered
//! separately through the Messages API. Inbound requests are authenticated
//! with the `X-Twilio-Signature` header.

pub mod adapter;
pub mod error;
pub mod signature;
pub mod twilio;

pub use adapter::{TwilioWebhook, WhatsAppAdapter, NOTHING_RECEIVED_REPLY};
pub use error::{Result, WhatsAppError};
pub use signature::{compute_signature, SignatureValidator, SIGNATURE_HEADER};
pub use twilio::{whatsapp_address, TwilioSender};

/// Content type of [`EMPTY_TWIML`].
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

/// TwiML answer telling Twilio not to send anything itself.
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;
