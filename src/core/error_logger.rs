//! Error logging module
//!
//! Append-only, line-oriented error/audit log. Every line is
//! `[YYYY-MM-DD HH:MM:SS] message` with an optional ` | Context: {json}`
//! suffix. Writing here never fails the caller: problems with the log file
//! itself are reported through the regular logger and dropped.

use chrono::Utc;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Timestamp format used at the start of every line
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error logger that appends lines to a text file
#[derive(Clone, Debug)]
pub struct ErrorLogger {
    path: Arc<PathBuf>,
}

impl ErrorLogger {
    /// Creates a new error logger writing to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        }
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line to the log
    pub fn log(&self, message: &str, context: Option<Value>) {
        let line = format_line(&Utc::now().format(LINE_TIMESTAMP_FORMAT).to_string(), message, context.as_ref());

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            log::warn!("Failed to write error log {}: {}", self.path.display(), e);
        }
    }

    /// Records a withdrawal request for later manual processing
    pub fn log_withdrawal(&self, chat_id: i64, amount: u64, requested_at: &str) {
        log::info!("Withdrawal request: chat_id={} amount={}", chat_id, amount);
        self.log(
            "Withdrawal request",
            Some(serde_json::json!({
                "chat_id": chat_id,
                "amount": amount,
                "timestamp": requested_at,
            })),
        );
    }
}

/// Builds a single log line (terminated by a newline)
fn format_line(timestamp: &str, message: &str, context: Option<&Value>) -> String {
    match context {
        Some(ctx) if !is_empty_context(ctx) => format!("[{}] {} | Context: {}\n", timestamp, message, ctx),
        _ => format!("[{}] {}\n", timestamp, message),
    }
}

fn is_empty_context(ctx: &Value) -> bool {
    match ctx {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
