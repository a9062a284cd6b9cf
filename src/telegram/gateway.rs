//! Outbound Bot API calls
//!
//! `MessagingGateway` is the seam between the update runner and Telegram, so
//! the runner can be exercised against a recording fake in tests.

use async_trait::async_trait;
use serde_json::json;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::core::config::economy::FALLBACK_BOT_USERNAME;
use crate::core::error::AppResult;
use crate::core::error_logger::ErrorLogger;
use crate::core::metrics;
use crate::core::retry::{retry, AlwaysRetryable, RetryConfig, RetryError};
use crate::telegram::bot::Command;

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Sends an HTML message, retrying on failure
    ///
    /// Returns false once all attempts failed; the failure is already logged.
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<InlineKeyboardMarkup>) -> bool;

    /// Acknowledges a callback query (best-effort, single attempt)
    async fn answer_callback(&self, callback_query_id: &str);

    /// Username of the bot, used in referral links
    async fn resolve_bot_identity(&self) -> String;

    async fn delete_webhook(&self) -> AppResult<()>;

    async fn set_webhook(&self, url: &str) -> AppResult<()>;

    /// Publishes the /start, /balance and /help command menu
    async fn register_commands(&self) -> AppResult<()>;
}

/// Gateway backed by the real Bot API
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
    error_log: ErrorLogger,
    retry: RetryConfig,
}

impl TelegramGateway {
    pub fn new(bot: Bot, error_log: ErrorLogger) -> Self {
        Self {
            bot,
            error_log,
            retry: RetryConfig::send_message(),
        }
    }

    /// Overrides the sendMessage retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<InlineKeyboardMarkup>) -> bool {
        let outcome = retry(&self.retry, || {
            let mut request = self.bot.send_message(ChatId(chat_id), text).parse_mode(ParseMode::Html);
            if let Some(keyboard) = keyboard.clone() {
                request = request.reply_markup(keyboard);
            }
            async move { request.await.map_err(AlwaysRetryable) }
        })
        .await;

        match outcome.result {
            Ok(_) => {
                metrics::MESSAGES_TOTAL.with_label_values(&["sent"]).inc();
                true
            }
            Err(RetryError::MaxRetriesExhausted { last_error, .. }) => {
                metrics::MESSAGES_TOTAL.with_label_values(&["failed"]).inc();
                log::error!(
                    "Failed to send message to {} after {} attempts: {}",
                    chat_id,
                    outcome.attempts,
                    last_error.0
                );
                self.error_log.log(
                    &format!("Failed to send message after {} attempts", outcome.attempts),
                    Some(json!({ "chat_id": chat_id })),
                );
                false
            }
        }
    }

    async fn answer_callback(&self, callback_query_id: &str) {
        if let Err(e) = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_query_id.to_string()))
            .await
        {
            log::warn!("Failed to answer callback query {}: {}", callback_query_id, e);
        }
    }

    async fn resolve_bot_identity(&self) -> String {
        match self.bot.get_me().await {
            Ok(me) => match me.user.username {
                Some(username) => username,
                None => {
                    log::warn!("getMe returned no username, using {}", FALLBACK_BOT_USERNAME);
                    FALLBACK_BOT_USERNAME.to_string()
                }
            },
            Err(e) => {
                log::error!("getMe failed, using {}: {}", FALLBACK_BOT_USERNAME, e);
                self.error_log.log(&format!("Failed to get bot info: {}", e), None);
                FALLBACK_BOT_USERNAME.to_string()
            }
        }
    }

    async fn delete_webhook(&self) -> AppResult<()> {
        self.bot.delete_webhook().await?;
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> AppResult<()> {
        self.bot.set_webhook(url::Url::parse(url)?).await?;
        Ok(())
    }

    async fn register_commands(&self) -> AppResult<()> {
        self.bot.set_my_commands(Command::bot_commands()).await?;
        Ok(())
    }
}
