use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use pointsbot::cli::{Cli, Commands};
use pointsbot::core::{config, init_logger, log_configuration, metrics, ErrorLogger};
use pointsbot::storage::UserStore;
use pointsbot::telegram::setup::{prompt_webhook_url, setup_webhook};
use pointsbot::telegram::{
    create_bot, run_webhook_server, AppState, Dispatcher, HandlerDeps, MessagingGateway, TelegramGateway,
};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the requested subcommand, `serve`
/// being the default.
///
/// # Errors
/// Returns an error if startup fails (logging, missing token or secret, bind).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from request handlers instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before the first config value is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Serve { port }) => run_server(port.unwrap_or(*config::PORT)).await,
        Some(Commands::SetupWebhook { url }) => run_setup(url).await,
        None => {
            log::info!("No command specified, running webhook server");
            run_server(*config::PORT).await
        }
    }
}

fn require_secret() -> Result<String> {
    if config::WEBHOOK_SECRET.is_empty() {
        anyhow::bail!("WEBHOOK_SECRET environment variable not set");
    }
    Ok(config::WEBHOOK_SECRET.clone())
}

fn build_gateway(error_log: &ErrorLogger) -> Result<TelegramGateway> {
    let bot = create_bot(&config::BOT_TOKEN)?;
    Ok(TelegramGateway::new(bot, error_log.clone()))
}

/// Runs the webhook server
async fn run_server(port: u16) -> Result<()> {
    log_configuration();
    metrics::init_metrics();

    let secret = require_secret()?;
    let error_log = ErrorLogger::new(config::ERROR_LOG.as_str());
    let gateway = build_gateway(&error_log)?;

    let bot_username = gateway.resolve_bot_identity().await;
    log::info!("Bot username: @{}", bot_username);

    let store = UserStore::new(config::USERS_FILE.as_str(), error_log.clone());
    log::info!("Users file: {}", store.path().display());

    let deps = HandlerDeps::new(
        store,
        Arc::new(gateway),
        Arc::new(Dispatcher::new(bot_username)),
        error_log,
    );

    run_webhook_server(port, AppState::new(deps, secret)).await
}

/// Registers the webhook and the command menu, then exits
async fn run_setup(url: Option<String>) -> Result<()> {
    let secret = require_secret()?;
    let error_log = ErrorLogger::new(config::ERROR_LOG.as_str());
    let gateway = build_gateway(&error_log)?;

    let base_url = match url {
        Some(url) => url,
        None => prompt_webhook_url()?,
    };

    match setup_webhook(&gateway, &base_url, &secret, &error_log).await {
        Ok(_) => {
            println!("✅ Webhook set successfully to {}", base_url);
            Ok(())
        }
        Err(e) => {
            println!("❌ Failed to set webhook. Check {} for details.", error_log.path().display());
            Err(e.into())
        }
    }
}
