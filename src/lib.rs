//! Pointsbot - webhook Telegram bot running a points and referral economy
//!
//! Users earn points on a cooldown, invite friends for a bonus, compare
//! themselves on a leaderboard and request withdrawals. All state lives in a
//! single JSON file.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, metrics and shared helpers
//! - `storage`: Flat-file user store
//! - `telegram`: Update decoding, dispatcher, Bot API gateway and webhook server

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, BotError, ErrorLogger};
pub use storage::{UserMap, UserRecord, UserStore};
pub use telegram::{Dispatcher, Effect, HandlerDeps, InboundEvent, MessagingGateway};
