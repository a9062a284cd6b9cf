//! Metrics collection for the bot using Prometheus
//!
//! Tracks webhook traffic, command usage, the points economy and the health
//! of outgoing Bot API calls and the state file.

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    /// Webhook deliveries by outcome
    /// Labels: outcome (processed/ignored/forbidden)
    pub static ref WEBHOOK_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "pointsbot_webhook_requests_total",
        "Total number of webhook deliveries by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Dispatched commands and button actions
    /// Labels: command (start/balance/help/earn/leaderboard/referrals/withdraw/unknown)
    pub static ref COMMANDS_TOTAL: CounterVec = register_counter_vec!(
        "pointsbot_commands_total",
        "Total number of handled commands and button actions",
        &["command"]
    )
    .unwrap();

    /// Outgoing sendMessage calls by final status
    /// Labels: status (sent/failed)
    pub static ref MESSAGES_TOTAL: CounterVec = register_counter_vec!(
        "pointsbot_messages_total",
        "Total number of outgoing messages by final status",
        &["status"]
    )
    .unwrap();

    /// Retried Bot API attempts
    pub static ref RETRIES_TOTAL: Counter = register_counter!(
        "pointsbot_retries_total",
        "Total number of retried Bot API attempts"
    )
    .unwrap();

    /// State file failures
    /// Labels: operation (load/save)
    pub static ref STORE_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "pointsbot_store_errors_total",
        "Total number of state file load/save failures",
        &["operation"]
    )
    .unwrap();

    /// New users seen for the first time
    pub static ref NEW_USERS_TOTAL: Counter = register_counter!(
        "pointsbot_new_users_total",
        "Total number of users created on first contact"
    )
    .unwrap();

    /// Successful referral bindings
    pub static ref REFERRALS_TOTAL: Counter = register_counter!(
        "pointsbot_referrals_total",
        "Total number of successful referral bindings"
    )
    .unwrap();

    /// Points credited (earn + referral bonus)
    /// Labels: source (earn/referral)
    pub static ref POINTS_CREDITED_TOTAL: CounterVec = register_counter_vec!(
        "pointsbot_points_credited_total",
        "Total number of points credited by source",
        &["source"]
    )
    .unwrap();

    /// Points withdrawn
    pub static ref POINTS_WITHDRAWN_TOTAL: Counter = register_counter!(
        "pointsbot_points_withdrawn_total",
        "Total number of points withdrawn"
    )
    .unwrap();
}

/// Touches every metric so all series show up in /metrics with zero values
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    for outcome in ["processed", "ignored", "forbidden"] {
        WEBHOOK_REQUESTS_TOTAL.with_label_values(&[outcome]);
    }
    for command in [
        "start",
        "balance",
        "help",
        "earn",
        "leaderboard",
        "referrals",
        "withdraw",
        "unknown",
    ] {
        COMMANDS_TOTAL.with_label_values(&[command]);
    }
    for status in ["sent", "failed"] {
        MESSAGES_TOTAL.with_label_values(&[status]);
    }
    for operation in ["load", "save"] {
        STORE_ERRORS_TOTAL.with_label_values(&[operation]);
    }
    for source in ["earn", "referral"] {
        POINTS_CREDITED_TOTAL.with_label_values(&[source]);
    }
    let _ = &*RETRIES_TOTAL;
    let _ = &*NEW_USERS_TOTAL;
    let _ = &*REFERRALS_TOTAL;
    let _ = &*POINTS_WITHDRAWN_TOTAL;

    log::info!("Metrics registry initialized");
}
