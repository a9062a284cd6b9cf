//! One-shot webhook registration (`setup-webhook` subcommand)

use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::core::error::{AppError, AppResult};
use crate::core::error_logger::ErrorLogger;
use crate::telegram::gateway::MessagingGateway;

/// Appends the shared secret to the public webhook URL
///
/// # Example
///
/// ```
/// use pointsbot::telegram::setup::webhook_url_with_token;
///
/// assert_eq!(
///     webhook_url_with_token("https://example.com/bot", "s3cret"),
///     "https://example.com/bot?token=s3cret"
/// );
/// ```
pub fn webhook_url_with_token(base_url: &str, secret: &str) -> String {
    let base_url = base_url.trim();
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let encoded: String = url::form_urlencoded::byte_serialize(secret.as_bytes()).collect();
    format!("{}{}token={}", base_url, separator, encoded)
}

/// Asks for the public URL on stdin
pub fn prompt_webhook_url() -> AppResult<String> {
    print!("Enter your webhook URL (e.g. https://example.com/bot): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let url = line.trim().to_string();
    if url.is_empty() {
        return Err(AppError::Config("Webhook URL is required".to_string()));
    }
    Ok(url)
}

/// Replaces any previous webhook with `base_url` + secret and publishes the command menu
///
/// Returns the registered URL. Failures are also written to the error log.
pub async fn setup_webhook(
    gateway: &dyn MessagingGateway,
    base_url: &str,
    secret: &str,
    error_log: &ErrorLogger,
) -> AppResult<String> {
    let url = webhook_url_with_token(base_url, secret);
    url::Url::parse(&url)?;

    if let Err(e) = gateway.delete_webhook().await {
        log::warn!("Failed to delete previous webhook: {}", e);
    }

    if let Err(e) = gateway.set_webhook(&url).await {
        log::error!("Failed to set webhook: {}", e);
        error_log.log(
            &format!("Failed to set webhook: {}", e),
            Some(json!({ "url": base_url })),
        );
        return Err(e);
    }
    log::info!("Webhook set to {}", base_url);

    if let Err(e) = gateway.register_commands().await {
        log::warn!("Failed to register bot commands: {}", e);
        error_log.log(&format!("Failed to register bot commands: {}", e), None);
    }

    Ok(url)
}
