//! Small helpers shared by the storage and telegram layers

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::core::config::referral::{CODE_ALPHABET, CODE_LENGTH};

/// Current time as Unix epoch seconds
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Formats epoch seconds as `YYYY-MM-DD HH:MM:SS` (UTC)
///
/// # Example
///
/// ```
/// use pointsbot::core::utils::format_timestamp;
///
/// assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
/// ```
pub fn format_timestamp(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Generates a random referral code from the unambiguous alphabet
pub fn random_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Returns a referral code for which `is_taken` is false
///
/// Keeps drawing until a free code comes up. With 32^8 possible codes this
/// terminates after one draw in practice.
pub fn unique_referral_code(mut is_taken: impl FnMut(&str) -> bool) -> String {
    loop {
        let code = random_referral_code();
        if !is_taken(&code) {
            return code;
        }
        log::debug!("Referral code collision on {}, drawing again", code);
    }
}
