//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod error_logger;
pub mod logging;
pub mod metrics;
pub mod metrics_server;
pub mod retry;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use error::{AppError, AppResult, BotError};
pub use error_logger::ErrorLogger;
pub use logging::{init_logger, log_configuration};
