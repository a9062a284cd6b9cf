//! Bot initialization and command parsing
//!
//! This module contains:
//! - Command enum definition (also used for the Telegram command menu)
//! - Bot instance creation
//! - Parsing of message text into commands

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "open the menu and get your referral link")]
    Start(String),
    #[command(description = "show your points and referrals")]
    Balance,
    #[command(description = "how earning, referrals and withdrawals work")]
    Help,
}

/// Parses message text into a command
///
/// Delegates to `BotCommands::parse`: a unit command must stand alone and an
/// `@mention` must name this bot. For `/start` the trimmed remainder is the
/// referral code, possibly empty. Returns `None` for anything else.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    match Command::parse(text.trim(), bot_username).ok()? {
        Command::Start(code) => Some(Command::Start(code.trim().to_string())),
        command => Some(command),
    }
}

/// Creates a Bot instance with custom or default API URL
///
/// # Arguments
/// * `token` - Bot API token
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError)` - Empty token, invalid BOT_API_URL or HTTP client failure
pub fn create_bot(token: &str) -> AppResult<Bot> {
    if token.is_empty() {
        return Err(AppError::Config("BOT_TOKEN environment variable not set".to_string()));
    }

    let client = ClientBuilder::new()
        .timeout(config::network::timeout())
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let bot = if let Some(ref bot_api_url) = *config::BOT_API_URL {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(bot_api_url)?;
        Bot::with_client(token, client).set_api_url(url)
    } else {
        Bot::with_client(token, client)
    };

    Ok(bot)
}
