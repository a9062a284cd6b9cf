//! Telegram bot integration: update decoding, dispatch, replies and the webhook

pub mod bot;
pub mod dispatcher;
pub mod gateway;
pub mod handlers;
pub mod keyboard;
pub mod messages;
pub mod setup;
pub mod update;
pub mod webhook;

// Re-exports for convenience
pub use bot::{create_bot, Command};
pub use dispatcher::{Dispatcher, Effect};
pub use gateway::{MessagingGateway, TelegramGateway};
pub use handlers::HandlerDeps;
pub use teloxide::Bot;
pub use update::InboundEvent;
pub use webhook::{run_webhook_server, webhook_router, AppState};
