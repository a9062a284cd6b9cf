//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A summary of the effective configuration at startup

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file (appended to, created if missing)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// Secrets are never printed, only whether they are set.
pub fn log_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    if config::WEBHOOK_SECRET.is_empty() {
        log::error!("❌ WEBHOOK_SECRET: not set");
    } else {
        log::info!("✅ WEBHOOK_SECRET: set");
    }

    log::info!("   USERS_FILE: {}", config::USERS_FILE.as_str());
    log::info!("   ERROR_LOG: {}", config::ERROR_LOG.as_str());
    log::info!("   PORT: {}", *config::PORT);
    if let Some(ref api_url) = *config::BOT_API_URL {
        log::info!("   BOT_API_URL: {}", api_url);
    }
}
