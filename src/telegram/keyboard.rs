//! Main inline keyboard and the callback actions behind its buttons

use strum::{AsRefStr, EnumString};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback data carried by the main menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MenuAction {
    Earn,
    Balance,
    Leaderboard,
    Referrals,
    Withdraw,
    Help,
}

impl MenuAction {
    /// Parses callback data; unknown ids yield `None`
    pub fn from_callback_data(data: &str) -> Option<Self> {
        data.parse().ok()
    }

    fn button(self, label: &str) -> InlineKeyboardButton {
        let data: &str = self.as_ref();
        InlineKeyboardButton::callback(label, data)
    }
}

/// The six-button menu attached to every reply
pub fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            MenuAction::Earn.button("💰 Earn Points"),
            MenuAction::Balance.button("💳 My Balance"),
        ],
        vec![
            MenuAction::Leaderboard.button("🏆 Leaderboard"),
            MenuAction::Referrals.button("👥 My Referrals"),
        ],
        vec![
            MenuAction::Withdraw.button("🏧 Withdraw"),
            MenuAction::Help.button("❓ Help Center"),
        ],
    ])
}
