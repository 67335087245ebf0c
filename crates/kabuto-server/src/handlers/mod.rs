//! Webhook and health handlers.

pub mod health;
pub mod telegram;
pub mod whatsapp;

pub use health::*;
pub use telegram::*;
pub use whatsapp::*;
