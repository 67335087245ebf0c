//! Kabuto server binary.
//!
//! Start the relay with:
//! ```bash
//! TELEGRAM_API_TOKEN=xxx OPENAI_API_KEY=xxx TWILIO_ACCOUNT_SID=xxx \
//! TWILIO_AUTH_TOKEN=xxx TWILIO_WHATSAPP_NUMBER=+14155238886 cargo run -p kabuto-server
//! ```

use std::sync::Arc;

use clap::Parser;
use kabuto_core::Config;
use kabuto_server::{serve, AppState};
use kabuto_telegram::{create_bot, get_username, register_webhook, run_polling};
use tracing_subscriber::EnvFilter;

/// Kabuto - Telegram and WhatsApp relay to a language model
#[derive(Parser, Debug)]
#[command(name = "kabuto")]
#[command(about = "Relays Telegram and WhatsApp messages to a language model")]
struct Args {
    /// Long-poll Telegram instead of registering the webhook
    #[arg(long)]
    polling: bool,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "kabuto=info,kabuto_core=info,kabuto_telegram=info,kabuto_whatsapp=info,kabuto_server=info,teloxide=warn",
        1 => "kabuto=debug,kabuto_core=debug,kabuto_telegram=debug,kabuto_whatsapp=debug,kabuto_server=debug,tower_http=debug,teloxide=info",
        2 => "kabuto=trace,kabuto_core=trace,kabuto_telegram=trace,kabuto_whatsapp=trace,kabuto_server=trace,tower_http=debug,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.server = config.server.with_port(port);
    }

    let bot = create_bot(&config.telegram);
    let username = match get_username(&bot).await {
        Ok(username) => {
            tracing::info!(username = %username, "Telegram bot initialized");
            username
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to get bot info, command mentions will not be recognised");
            String::new()
        }
    };

    let state = AppState::from_config(&config, bot.clone(), &username)?;

    if args.polling {
        let adapter = Arc::clone(&state.telegram);
        tokio::spawn(async move {
            if let Err(e) = run_polling(bot, adapter).await {
                tracing::error!(error = %e, "Telegram polling stopped");
            }
        });
    } else if let Err(e) = register_webhook(&bot, &config.telegram).await {
        tracing::warn!(error = %e, "Failed to register Telegram webhook");
    }

    let mode = if args.polling { "polling" } else { "webhook" };
    tracing::info!(
        mode,
        model = %config.completion.model,
        "Kabuto starting"
    );

    serve(&config.server, state).await?;

    Ok(())
}
