//! Flat-file user store
//!
//! The whole user map lives in one pretty-printed JSON object keyed by chat id.
//! It is loaded in full and written back in full on every update; there are no
//! field-level updates. Field names match the legacy `users.json` layout so an
//! existing file can be reused as is.

use chrono::{NaiveDateTime, Utc};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::core::error::AppResult;
use crate::core::error_logger::ErrorLogger;
use crate::core::metrics;
use crate::core::utils::{random_referral_code, unique_referral_code};

/// Ordered mapping chat id -> record, iterated in first-contact order
pub type UserMap = IndexMap<i64, UserRecord>;

/// Name used when Telegram does not provide one
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// One user of the points economy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub balance: u64,
    /// Epoch seconds of the last successful earn, 0 if never
    #[serde(rename = "last_earn", default)]
    pub last_earn_at: i64,
    #[serde(rename = "referrals", default)]
    pub referral_count: u64,
    #[serde(rename = "ref_code")]
    pub referral_code: String,
    #[serde(default)]
    pub referred_by: Option<i64>,
    #[serde(rename = "name", default = "default_display_name")]
    pub display_name: String,
    #[serde(rename = "joined", with = "joined_format", default = "now_naive")]
    pub joined_at: NaiveDateTime,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

fn now_naive() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl UserRecord {
    /// Fresh record for a first contact
    pub fn new(referral_code: String, display_name: &str, joined_at: NaiveDateTime) -> Self {
        let display_name = if display_name.trim().is_empty() {
            default_display_name()
        } else {
            display_name.to_string()
        };

        Self {
            balance: 0,
            last_earn_at: 0,
            referral_count: 0,
            referral_code,
            referred_by: None,
            display_name,
            joined_at,
        }
    }
}

/// Returns the record for `chat_id`, creating it on first contact
///
/// The boolean is true when the record was created by this call. New records
/// get a referral code no other user in `users` holds.
pub fn ensure_user<'a>(
    users: &'a mut UserMap,
    chat_id: i64,
    display_name: &str,
    now: NaiveDateTime,
) -> (&'a mut UserRecord, bool) {
    let code = if users.contains_key(&chat_id) {
        None
    } else {
        Some(unique_referral_code(|candidate| {
            users.values().any(|u| u.referral_code == candidate)
        }))
    };

    match users.entry(chat_id) {
        Entry::Occupied(entry) => (entry.into_mut(), false),
        Entry::Vacant(entry) => {
            let code = code.unwrap_or_else(random_referral_code);
            log::info!("New user {} ({}) with referral code {}", chat_id, display_name, code);
            metrics::NEW_USERS_TOTAL.inc();
            (entry.insert(UserRecord::new(code, display_name, now)), true)
        }
    }
}

/// Chat id of the first user (in map order) holding `code`, other than `exclude`
pub fn find_by_referral_code(users: &UserMap, code: &str, exclude: i64) -> Option<i64> {
    users
        .iter()
        .find(|(id, user)| **id != exclude && user.referral_code == code)
        .map(|(id, _)| *id)
}

/// All users ranked by balance, highest first
///
/// The sort is stable: users with equal balances keep their map order.
pub fn ranking(users: &UserMap) -> Vec<(i64, &UserRecord)> {
    let mut ranked: Vec<(i64, &UserRecord)> = users.iter().map(|(id, u)| (*id, u)).collect();
    ranked.sort_by(|a, b| b.1.balance.cmp(&a.1.balance));
    ranked
}

/// `joined` is stored as `YYYY-MM-DD HH:MM:SS`
mod joined_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Snapshot store backed by a single JSON file
#[derive(Clone)]
pub struct UserStore {
    path: PathBuf,
    error_log: ErrorLogger,
    lock: Arc<Mutex<()>>,
}

impl UserStore {
    pub fn new(path: impl AsRef<Path>, error_log: ErrorLogger) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            error_log,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes load-mutate-save cycles within this process
    ///
    /// Hold the guard from `load` until `save` returns.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Reads the whole map
    ///
    /// A missing file is created as `{}`. Any read or parse error is logged and
    /// an empty map is returned.
    pub fn load(&self) -> UserMap {
        match self.try_load() {
            Ok(users) => users,
            Err(e) => {
                log::error!("Load users failed ({}): {}", self.path.display(), e);
                metrics::STORE_ERRORS_TOTAL.with_label_values(&["load"]).inc();
                self.error_log.log(
                    &format!("Load users failed: {}", e),
                    Some(serde_json::json!({ "path": self.path.display().to_string() })),
                );
                UserMap::new()
            }
        }
    }

    fn try_load(&self) -> AppResult<UserMap> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("Users file {} not found, creating it", self.path.display());
                fs::write(&self.path, "{}")?;
                return Ok(UserMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(UserMap::new());
        }
        // Older deployments initialised the file as an empty JSON array
        if data.trim_start().starts_with('[') {
            let items: Vec<serde_json::Value> = serde_json::from_str(&data)?;
            if items.is_empty() {
                return Ok(UserMap::new());
            }
        }

        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the whole map, replacing the file in one rename
    ///
    /// Returns false (after logging) when the write failed.
    pub fn save(&self, users: &UserMap) -> bool {
        match self.try_save(users) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Save users failed ({}): {}", self.path.display(), e);
                metrics::STORE_ERRORS_TOTAL.with_label_values(&["save"]).inc();
                self.error_log.log(
                    &format!("Save users failed: {}", e),
                    Some(serde_json::json!({ "path": self.path.display().to_string() })),
                );
                false
            }
        }
    }

    fn try_save(&self, users: &UserMap) -> AppResult<()> {
        let data = serde_json::to_string_pretty(users)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, data)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "users.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
