//! HTTP entry point for Kabuto.
//!
//! Exposes the channel webhooks and a health route:
//! - `POST /webhook/telegram` - Telegram update JSON
//! - `POST /webhook/whatsapp` - Twilio form payload
//! - `GET /health` - liveness
//!
//! # Example
//!
//! ```no_run
//! use kabuto_core::Config;
//! use kabuto_server::{serve, AppState};
//! use kabuto_telegram::create_bot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let bot = create_bot(&config.telegram);
//!     let state = AppState::from_config(&config, bot, "")?;
//!
//!     serve(&config.server, state).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{Result, WebhookError};
pub use router::{create_router, serve};
pub use state::AppState;
