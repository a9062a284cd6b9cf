//! Update payloads and a scratch environment for integration tests

use std::sync::Arc;

use pointsbot::core::ErrorLogger;
use pointsbot::storage::{UserMap, UserStore};
use pointsbot::telegram::{Dispatcher, HandlerDeps};
use serde_json::{json, Value};
use tempfile::TempDir;

use super::gateway::RecordingGateway;

/// Telegram `Update` carrying a text message
pub fn message_update_json(chat_id: i64, first_name: &str, text: &str) -> Value {
    json!({
        "update_id": 1000,
        "message": {
            "message_id": 1,
            "date": 1_709_294_400,
            "chat": {"id": chat_id, "type": "private", "first_name": first_name},
            "from": {"id": chat_id, "is_bot": false, "first_name": first_name},
            "text": text
        }
    })
}

/// Telegram `Update` carrying an inline button press
pub fn callback_update_json(chat_id: i64, first_name: &str, data: &str) -> Value {
    json!({
        "update_id": 1001,
        "callback_query": {
            "id": format!("cbq-{}", chat_id),
            "from": {"id": chat_id, "is_bot": false, "first_name": first_name},
            "message": {
                "message_id": 2,
                "date": 1_709_294_400,
                "chat": {"id": chat_id, "type": "private", "first_name": first_name}
            },
            "chat_instance": "ci",
            "data": data
        }
    })
}

/// Temp directory holding the users file and the error log
pub struct TestEnvironment {
    pub dir: TempDir,
    pub gateway: Arc<RecordingGateway>,
    pub deps: HandlerDeps,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::default());
        let error_log = ErrorLogger::new(dir.path().join("error.log"));
        let store = UserStore::new(dir.path().join("users.json"), error_log.clone());
        let deps = HandlerDeps::new(
            store,
            gateway.clone(),
            Arc::new(Dispatcher::new("PointsBot")),
            error_log,
        );

        Self { dir, gateway, deps }
    }

    pub fn users(&self) -> UserMap {
        self.deps.store.load()
    }

    pub fn users_file_exists(&self) -> bool {
        self.deps.store.path().exists()
    }

    pub fn error_log(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("error.log")).unwrap_or_default()
    }
}
