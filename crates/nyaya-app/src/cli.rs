//! CLI argument definitions for the Nyaya terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Nyaya: ask legal questions against an answering service from the terminal.
#[derive(Parser, Debug)]
#[command(name = "nyaya", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the answering service.
    #[arg(short = 'u', long = "api-url")]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Pause before showing each reply, in milliseconds.
    #[arg(long = "reply-delay-ms")]
    pub reply_delay_ms: Option<u64>,

    /// Ask a single question, print the reply and exit.
    #[arg(short = 'a', long = "ask")]
    pub ask: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > NYAYA_CONFIG env var > ~/.nyaya/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("NYAYA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the answering service base URL.
    ///
    /// Priority: --api-url flag > NYAYA_API_URL env var > config file value.
    pub fn resolve_api_url(&self, config_url: &str) -> String {
        pick_api_url(
            self.api_url.as_deref(),
            std::env::var("NYAYA_API_URL").ok().as_deref(),
            config_url,
        )
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the reply delay, falling back to the config file value.
    pub fn resolve_reply_delay_ms(&self, config_delay: u64) -> u64 {
        self.reply_delay_ms.unwrap_or(config_delay)
    }
}

fn pick_api_url(flag: Option<&str>, env: Option<&str>, config_url: &str) -> String {
    [flag, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(config_url)
        .to_string()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".nyaya").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".nyaya").join("config.toml");
    }
    PathBuf::from("config.toml")
}
