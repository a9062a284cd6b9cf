//! Inbound webhook payloads
//!
//! Only the handful of `Update` fields the bot reacts to are decoded; every
//! other field and update kind is ignored. The raw structs below are kept
//! instead of `teloxide::types::Update` so that partial or newer payloads
//! still decode.

use serde::Deserialize;

/// One decoded inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A chat message (text may be empty for stickers, photos, ...)
    Message {
        chat_id: i64,
        text: String,
        sender_name: String,
    },
    /// An inline keyboard button press
    CallbackAction {
        chat_id: i64,
        action_id: String,
        callback_query_id: String,
        sender_name: String,
    },
}

impl InboundEvent {
    /// Chat the event came from
    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::Message { chat_id, .. } | InboundEvent::CallbackAction { chat_id, .. } => *chat_id,
        }
    }

    /// Sender's first name, empty when the sender is unknown
    pub fn sender_name(&self) -> &str {
        match self {
            InboundEvent::Message { sender_name, .. } | InboundEvent::CallbackAction { sender_name, .. } => {
                sender_name
            }
        }
    }

    /// Decodes a raw webhook body
    ///
    /// Returns `None` for invalid JSON and for updates that carry neither a
    /// message nor a callback query.
    pub fn from_json(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<RawUpdate>(body) {
            Ok(update) => Self::from_raw(update),
            Err(e) => {
                log::debug!("Ignoring undecodable update: {}", e);
                None
            }
        }
    }

    fn from_raw(update: RawUpdate) -> Option<Self> {
        if let Some(message) = update.message {
            return Some(InboundEvent::Message {
                chat_id: message.chat.id,
                text: message.text.unwrap_or_default().trim().to_string(),
                sender_name: sender_name(message.from.as_ref()),
            });
        }

        let query = update.callback_query?;
        // Queries on inline-mode messages carry no chat; answer in the private chat
        let chat_id = query
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .or_else(|| query.from.as_ref().map(|u| u.id))?;

        Some(InboundEvent::CallbackAction {
            chat_id,
            action_id: query.data.unwrap_or_default(),
            callback_query_id: query.id,
            sender_name: sender_name(query.from.as_ref()),
        })
    }
}

fn sender_name(user: Option<&RawUser>) -> String {
    user.and_then(|u| u.first_name.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    message: Option<RawMessage>,
    callback_query: Option<RawCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
    from: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: i64,
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCallbackQuery {
    id: String,
    data: Option<String>,
    from: Option<RawUser>,
    message: Option<RawCallbackMessage>,
}

#[derive(Debug, Deserialize)]
struct RawCallbackMessage {
    chat: RawChat,
}
