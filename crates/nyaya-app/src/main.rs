//! Nyaya terminal client - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Install tracing (stderr, so logs stay out of the transcript)
//! 3. Build the HTTP answering client and the session controller
//! 4. Answer a single `--ask` question, or run the interactive loop

mod cli;
mod render;
mod repl;

use std::sync::Arc;

use clap::Parser;
use nyaya_chat::SessionController;
use nyaya_client::{ClientConfig, HttpAnsweringClient};
use nyaya_core::{NyayaConfig, NyayaError};
use tokio::io::BufReader;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        NyayaConfig::load(&config_file)?
    } else {
        NyayaConfig::default()
    };
    config.service.base_url = args.resolve_api_url(&config.service.base_url);
    config.chat.reply_delay_ms = args.resolve_reply_delay_ms(config.chat.reply_delay_ms);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Nyaya v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::debug!(path = %config_file.display(), "No config file, using defaults");
    }

    // Answering service.
    let mut client_config = ClientConfig::new(config.service.base_url.clone());
    if let Some(timeout) = config.service.timeout() {
        client_config = client_config.with_timeout(timeout);
    }
    let client = HttpAnsweringClient::new(client_config)
        .map_err(|e| NyayaError::Config(format!("failed to build HTTP client: {}", e)))?;
    tracing::info!(url = %client.config().chat_url(), "Answering service configured");

    let controller = SessionController::new(Arc::new(client), config.chat.clone());
    let mut stdout = std::io::stdout();

    if let Some(question) = args.ask.as_deref() {
        repl::ask(&controller, question, &mut stdout).await?;
        return Ok(());
    }

    println!("{}\n", render::welcome(&config.service.base_url));
    repl::run(&controller, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    tracing::info!(messages = controller.with_store(|s| s.len()), "Session ended");
    Ok(())
}
