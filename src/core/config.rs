use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Shared secret expected in the `token` query parameter of every webhook delivery
/// Read from WEBHOOK_SECRET environment variable
pub static WEBHOOK_SECRET: Lazy<String> =
    Lazy::new(|| env::var("WEBHOOK_SECRET").unwrap_or_else(|_| String::new()));

/// Users state file path
/// Read from USERS_FILE environment variable
/// Default: users.json
pub static USERS_FILE: Lazy<String> =
    Lazy::new(|| env::var("USERS_FILE").unwrap_or_else(|_| "users.json".to_string()));

/// Append-only error/audit log path
/// Read from ERROR_LOG environment variable
/// Default: error.log
pub static ERROR_LOG: Lazy<String> =
    Lazy::new(|| env::var("ERROR_LOG").unwrap_or_else(|_| "error.log".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Port the webhook server listens on
/// Read from PORT environment variable (set by most container hosts)
/// Default: 8080
pub static PORT: Lazy<u16> = Lazy::new(|| {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
});

/// Custom Bot API server URL
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Points economy rules
pub mod economy {
    /// Points credited by one successful earn action
    pub const EARN_REWARD: u64 = 10;

    /// Seconds a user has to wait between two earn actions
    pub const EARN_COOLDOWN_SECS: i64 = 60;

    /// Points credited to the referrer when a new user joins with their code
    pub const REFERRAL_BONUS: u64 = 50;

    /// Smallest balance that can be withdrawn
    pub const MIN_WITHDRAWAL: u64 = 100;

    /// Number of entries shown on the leaderboard
    pub const LEADERBOARD_SIZE: usize = 5;

    /// Bot username used in referral links when getMe fails
    pub const FALLBACK_BOT_USERNAME: &str = "YourBot";
}

/// Referral code generation
pub mod referral {
    /// Length of generated referral codes
    pub const CODE_LENGTH: usize = 8;

    /// Alphabet without look-alike characters (no 0/O, 1/I)
    pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
}

/// Retry configuration for outgoing messages
pub mod retry {
    use super::Duration;

    /// Additional attempts after the first failed sendMessage
    pub const SEND_MAX_RETRIES: u32 = 2;

    /// Fixed delay between sendMessage attempts (in seconds)
    pub const SEND_RETRY_DELAY_SECS: u64 = 1;

    /// sendMessage retry delay duration
    pub fn send_delay() -> Duration {
        Duration::from_secs(SEND_RETRY_DELAY_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
