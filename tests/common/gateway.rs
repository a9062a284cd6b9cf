//! Gateway fake that records every outbound call

use std::sync::Mutex;

use async_trait::async_trait;
use pointsbot::core::AppResult;
use pointsbot::telegram::MessagingGateway;
use teloxide::types::InlineKeyboardMarkup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Send {
        chat_id: i64,
        text: String,
        with_keyboard: bool,
    },
    Answer(String),
    DeleteWebhook,
    SetWebhook(String),
    RegisterCommands,
}

#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts sent to `chat_id`, in order
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Send { chat_id: to, text, .. } if to == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<InlineKeyboardMarkup>) -> bool {
        self.record(RecordedCall::Send {
            chat_id,
            text: text.to_string(),
            with_keyboard: keyboard.is_some(),
        });
        true
    }

    async fn answer_callback(&self, callback_query_id: &str) {
        self.record(RecordedCall::Answer(callback_query_id.to_string()));
    }

    async fn resolve_bot_identity(&self) -> String {
        "PointsBot".to_string()
    }

    async fn delete_webhook(&self) -> AppResult<()> {
        self.record(RecordedCall::DeleteWebhook);
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> AppResult<()> {
        self.record(RecordedCall::SetWebhook(url.to_string()));
        Ok(())
    }

    async fn register_commands(&self) -> AppResult<()> {
        self.record(RecordedCall::RegisterCommands);
        Ok(())
    }
}
