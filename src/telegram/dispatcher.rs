//! Update dispatcher
//!
//! Turns one inbound event plus the full user map into an ordered list of
//! outbound effects. The dispatcher only mutates the map it is handed; IO
//! (store, Bot API, audit log) is done by the caller.

use chrono::{DateTime, NaiveDateTime};
use teloxide::types::InlineKeyboardMarkup;

use crate::core::config::economy::{
    EARN_COOLDOWN_SECS, EARN_REWARD, LEADERBOARD_SIZE, MIN_WITHDRAWAL, REFERRAL_BONUS,
};
use crate::core::metrics;
use crate::storage::users::{ensure_user, find_by_referral_code, ranking, UserMap};
use crate::telegram::bot::{parse_command, Command};
use crate::telegram::keyboard::{main_keyboard, MenuAction};
use crate::telegram::messages;
use crate::telegram::update::InboundEvent;

/// Side effect requested by the dispatcher, executed in order by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Acknowledge a button press (stops the client spinner)
    AnswerCallback { callback_query_id: String },
    SendMessage {
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    /// Append a withdrawal audit record
    RecordWithdrawal { chat_id: i64, amount: u64, at: i64 },
}

impl Effect {
    fn reply(chat_id: i64, text: String) -> Self {
        Effect::SendMessage {
            chat_id,
            text,
            keyboard: Some(main_keyboard()),
        }
    }
}

/// Command and action semantics of the points economy
#[derive(Debug, Clone)]
pub struct Dispatcher {
    bot_username: String,
}

impl Dispatcher {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Handles one event
    ///
    /// `now` is the current time in epoch seconds. The returned effects always
    /// contain exactly one reply to the event's chat; callback events get an
    /// acknowledgment first.
    pub fn handle(&self, event: &InboundEvent, users: &mut UserMap, now: i64) -> Vec<Effect> {
        let chat_id = event.chat_id();
        let sender_name = event.sender_name().trim();
        let (user, _created) = ensure_user(users, chat_id, sender_name, joined_at(now));
        // Events without a sender keep the last known name
        if !sender_name.is_empty() {
            user.display_name = sender_name.to_string();
        }

        match event {
            InboundEvent::Message { text, .. } => self.handle_message(chat_id, text, users),
            InboundEvent::CallbackAction {
                action_id,
                callback_query_id,
                ..
            } => {
                let mut effects = vec![Effect::AnswerCallback {
                    callback_query_id: callback_query_id.clone(),
                }];
                effects.extend(self.handle_action(chat_id, action_id, users, now));
                effects
            }
        }
    }

    fn handle_message(&self, chat_id: i64, text: &str, users: &mut UserMap) -> Vec<Effect> {
        match parse_command(text, self.bot_username()) {
            Some(Command::Start(code)) => {
                metrics::COMMANDS_TOTAL.with_label_values(&["start"]).inc();
                let mut effects = self.bind_referral(chat_id, &code, users);
                effects.push(Effect::reply(chat_id, self.welcome(chat_id, users)));
                effects
            }
            Some(Command::Balance) => {
                metrics::COMMANDS_TOTAL.with_label_values(&["balance"]).inc();
                vec![Effect::reply(chat_id, balance_text(chat_id, users))]
            }
            Some(Command::Help) => {
                metrics::COMMANDS_TOTAL.with_label_values(&["help"]).inc();
                vec![Effect::reply(chat_id, messages::help())]
            }
            None => {
                metrics::COMMANDS_TOTAL.with_label_values(&["unknown"]).inc();
                vec![Effect::reply(chat_id, messages::unrecognized_command())]
            }
        }
    }

    /// Links `chat_id` to the owner of `code` and credits the referrer
    ///
    /// No-op for an empty code, an already referred user, an unknown code or
    /// the user's own code. Returns the referrer notification on success.
    fn bind_referral(&self, chat_id: i64, code: &str, users: &mut UserMap) -> Vec<Effect> {
        if code.is_empty() {
            return Vec::new();
        }
        let (already_referred, new_user_name) = match users.get(&chat_id) {
            Some(user) => (user.referred_by.is_some(), user.display_name.clone()),
            None => return Vec::new(),
        };
        if already_referred {
            log::debug!("User {} already has a referrer, ignoring code {}", chat_id, code);
            return Vec::new();
        }
        let Some(referrer_id) = find_by_referral_code(users, code, chat_id) else {
            log::debug!("Referral code {} from {} matches no other user", code, chat_id);
            return Vec::new();
        };

        if let Some(user) = users.get_mut(&chat_id) {
            user.referred_by = Some(referrer_id);
        }
        if let Some(referrer) = users.get_mut(&referrer_id) {
            referrer.referral_count += 1;
            referrer.balance += REFERRAL_BONUS;
        }

        log::info!("User {} joined via referral of {}", chat_id, referrer_id);
        metrics::REFERRALS_TOTAL.inc();
        metrics::POINTS_CREDITED_TOTAL
            .with_label_values(&["referral"])
            .inc_by(REFERRAL_BONUS as f64);

        vec![Effect::SendMessage {
            chat_id: referrer_id,
            text: messages::new_referral(&new_user_name),
            keyboard: None,
        }]
    }

    fn handle_action(&self, chat_id: i64, action_id: &str, users: &mut UserMap, now: i64) -> Vec<Effect> {
        let Some(action) = MenuAction::from_callback_data(action_id) else {
            log::debug!("Unknown callback action {:?} from {}", action_id, chat_id);
            metrics::COMMANDS_TOTAL.with_label_values(&["unknown"]).inc();
            return vec![Effect::reply(chat_id, messages::unknown_action())];
        };
        let label: &str = action.as_ref();
        metrics::COMMANDS_TOTAL.with_label_values(&[label]).inc();

        match action {
            MenuAction::Earn => vec![Effect::reply(chat_id, earn(chat_id, users, now))],
            MenuAction::Balance => vec![Effect::reply(chat_id, balance_text(chat_id, users))],
            MenuAction::Leaderboard => vec![Effect::reply(chat_id, leaderboard_text(chat_id, users))],
            MenuAction::Referrals => vec![Effect::reply(chat_id, self.referrals_text(chat_id, users))],
            MenuAction::Withdraw => withdraw(chat_id, users, now),
            MenuAction::Help => vec![Effect::reply(chat_id, messages::help())],
        }
    }

    fn welcome(&self, chat_id: i64, users: &UserMap) -> String {
        match users.get(&chat_id) {
            Some(user) => messages::welcome(
                &user.display_name,
                &user.referral_code,
                &messages::referral_link(&self.bot_username, &user.referral_code),
            ),
            None => messages::unrecognized_command(),
        }
    }

    fn referrals_text(&self, chat_id: i64, users: &UserMap) -> String {
        match users.get(&chat_id) {
            Some(user) => messages::referrals(
                &user.referral_code,
                user.referral_count,
                &messages::referral_link(&self.bot_username, &user.referral_code),
            ),
            None => messages::unknown_action(),
        }
    }
}

/// Record timestamps are kept at whole-second precision
fn joined_at(now: i64) -> NaiveDateTime {
    DateTime::from_timestamp(now, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

fn balance_text(chat_id: i64, users: &UserMap) -> String {
    let (balance, referrals) = users
        .get(&chat_id)
        .map(|u| (u.balance, u.referral_count))
        .unwrap_or_default();
    messages::balance(balance, referrals)
}

fn earn(chat_id: i64, users: &mut UserMap, now: i64) -> String {
    let Some(user) = users.get_mut(&chat_id) else {
        return messages::unknown_action();
    };

    // A clock that went backwards counts as no time elapsed
    let elapsed = now.saturating_sub(user.last_earn_at).max(0);
    if user.last_earn_at != 0 && elapsed < EARN_COOLDOWN_SECS {
        return messages::earn_cooldown(EARN_COOLDOWN_SECS - elapsed);
    }

    user.balance += EARN_REWARD;
    user.last_earn_at = now;
    metrics::POINTS_CREDITED_TOTAL
        .with_label_values(&["earn"])
        .inc_by(EARN_REWARD as f64);
    messages::earned(EARN_REWARD, user.balance)
}

fn leaderboard_text(chat_id: i64, users: &UserMap) -> String {
    let ranked = ranking(users);
    let top: Vec<(&str, u64)> = ranked
        .iter()
        .take(LEADERBOARD_SIZE)
        .map(|(_, u)| (u.display_name.as_str(), u.balance))
        .collect();

    let own_position = ranked
        .iter()
        .position(|(id, _)| *id == chat_id)
        .map(|idx| (idx + 1, ranked[idx].1.balance))
        .filter(|(position, _)| *position > LEADERBOARD_SIZE);

    messages::leaderboard(&top, own_position)
}

fn withdraw(chat_id: i64, users: &mut UserMap, now: i64) -> Vec<Effect> {
    let Some(user) = users.get_mut(&chat_id) else {
        return vec![Effect::reply(chat_id, messages::unknown_action())];
    };

    if user.balance < MIN_WITHDRAWAL {
        return vec![Effect::reply(chat_id, messages::withdraw_shortfall(user.balance))];
    }

    let amount = std::mem::take(&mut user.balance);
    log::info!("User {} requested withdrawal of {} points", chat_id, amount);
    metrics::POINTS_WITHDRAWN_TOTAL.inc_by(amount as f64);

    vec![
        Effect::reply(chat_id, messages::withdraw_requested(amount)),
        Effect::RecordWithdrawal {
            chat_id,
            amount,
            at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::users::UserRecord;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_709_294_400;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new("PointsBot")
    }

    fn message(chat_id: i64, text: &str) -> InboundEvent {
        InboundEvent::Message {
            chat_id,
            text: text.to_string(),
            sender_name: format!("user{}", chat_id),
        }
    }

    fn action(chat_id: i64, action_id: &str) -> InboundEvent {
        InboundEvent::CallbackAction {
            chat_id,
            action_id: action_id.to_string(),
            callback_query_id: format!("cbq-{}", chat_id),
            sender_name: format!("user{}", chat_id),
        }
    }

    fn replies(effects: &[Effect]) -> Vec<(i64, &str)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::SendMessage { chat_id, text, .. } => Some((*chat_id, text.as_str())),
                _ => None,
            })
            .collect()
    }

    fn only_reply(effects: &[Effect]) -> &str {
        let replies = replies(effects);
        assert_eq!(replies.len(), 1, "expected exactly one reply: {:?}", effects);
        replies[0].1
    }

    fn seeded(balances: &[(i64, u64)]) -> UserMap {
        let mut users = UserMap::new();
        for (id, balance) in balances {
            let mut user = UserRecord::new(format!("CODE{}", id), &format!("user{}", id), joined_at(NOW));
            user.balance = *balance;
            users.insert(*id, user);
        }
        users
    }

    #[test]
    fn test_first_event_creates_record() {
        let mut users = UserMap::new();
        let effects = dispatcher().handle(&message(1, "/start"), &mut users, NOW);

        assert_eq!(users.len(), 1);
        let user = &users[&1];
        assert_eq!(user.balance, 0);
        assert_eq!(user.referral_count, 0);
        assert_eq!(user.referred_by, None);
        assert!(!user.referral_code.is_empty());
        assert_eq!(user.joined_at.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-01 12:00:00");

        let text = only_reply(&effects);
        assert!(text.contains(&user.referral_code));
        assert!(text.contains(&format!("https://t.me/PointsBot?start={}", user.referral_code)));
    }

    #[test]
    fn test_display_name_refreshed_on_every_event() {
        let mut users = UserMap::new();
        dispatcher().handle(&message(1, "hi"), &mut users, NOW);
        let renamed = InboundEvent::CallbackAction {
            chat_id: 1,
            action_id: "help".to_string(),
            callback_query_id: "q".to_string(),
            sender_name: "Renamed".to_string(),
        };
        dispatcher().handle(&renamed, &mut users, NOW);
        assert_eq!(users[&1].display_name, "Renamed");
    }

    #[test]
    fn test_referral_binding_credits_referrer_once() {
        let d = dispatcher();
        let mut users = UserMap::new();
        d.handle(&message(1, "/start"), &mut users, NOW);
        let code = users[&1].referral_code.clone();

        let effects = d.handle(&message(2, &format!("/start {}", code)), &mut users, NOW);
        assert_eq!(users[&2].referred_by, Some(1));
        assert_eq!(users[&1].referral_count, 1);
        assert_eq!(users[&1].balance, 50);

        let sent = replies(&effects);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, 1);
        assert!(sent[0].1.contains("New Referral!"));
        assert!(sent[0].1.contains("user2"));
        assert!(matches!(&effects[0], Effect::SendMessage { keyboard: None, .. }));
        assert_eq!(sent[1].0, 2);

        // Repeating the deep link changes nothing
        let effects = d.handle(&message(2, &format!("/start {}", code)), &mut users, NOW);
        assert_eq!(users[&1].referral_count, 1);
        assert_eq!(users[&1].balance, 50);
        assert_eq!(replies(&effects).len(), 1);
    }

    #[test]
    fn test_no_self_referral() {
        let d = dispatcher();
        let mut users = UserMap::new();
        d.handle(&message(1, "/start"), &mut users, NOW);
        let code = users[&1].referral_code.clone();

        d.handle(&message(1, &format!("/start {}", code)), &mut users, NOW);
        assert_eq!(users[&1].referred_by, None);
        assert_eq!(users[&1].referral_count, 0);
        assert_eq!(users[&1].balance, 0);
    }

    #[test]
    fn test_unknown_referral_code_is_ignored() {
        let mut users = seeded(&[(1, 0)]);
        let effects = dispatcher().handle(&message(2, "/start NOSUCHCODE"), &mut users, NOW);

        assert_eq!(users[&2].referred_by, None);
        assert_eq!(users[&1].referral_count, 0);
        assert!(only_reply(&effects).contains("Welcome, user2!"));
    }

    #[test]
    fn test_earn_cooldown() {
        let d = dispatcher();
        let mut users = UserMap::new();

        let text = only_reply(&d.handle(&action(1, "earn"), &mut users, NOW)).to_string();
        assert!(text.contains("New balance: <b>10 points</b>"));
        assert_eq!(users[&1].last_earn_at, NOW);

        let text = only_reply(&d.handle(&action(1, "earn"), &mut users, NOW + 30)).to_string();
        assert!(text.contains("30 seconds before earning again"));
        assert_eq!(users[&1].balance, 10);
        assert_eq!(users[&1].last_earn_at, NOW);

        d.handle(&action(1, "earn"), &mut users, NOW + 60);
        assert_eq!(users[&1].balance, 20);
        d.handle(&action(1, "earn"), &mut users, NOW + 125);
        assert_eq!(users[&1].balance, 30);
    }

    #[test]
    fn test_earn_with_clock_skew_waits_full_cooldown() {
        let d = dispatcher();
        let mut users = UserMap::new();
        d.handle(&action(1, "earn"), &mut users, NOW);

        let text = only_reply(&d.handle(&action(1, "earn"), &mut users, NOW - 100)).to_string();
        assert!(text.contains("60 seconds before earning again"));
        assert_eq!(users[&1].balance, 10);
    }

    #[test]
    fn test_callback_is_acknowledged_first() {
        let mut users = UserMap::new();
        let effects = dispatcher().handle(&action(7, "balance"), &mut users, NOW);

        assert_eq!(
            effects[0],
            Effect::AnswerCallback {
                callback_query_id: "cbq-7".to_string()
            }
        );
        assert!(only_reply(&effects).contains("Points: <b>0</b>"));
        assert!(matches!(&effects[1], Effect::SendMessage { keyboard: Some(_), .. }));
    }

    #[test]
    fn test_withdraw_below_minimum() {
        let mut users = seeded(&[(1, 35)]);
        let effects = dispatcher().handle(&action(1, "withdraw"), &mut users, NOW);

        assert_eq!(users[&1].balance, 35);
        assert!(only_reply(&effects).contains("You need <b>65 more points</b>"));
        assert!(!effects.iter().any(|e| matches!(e, Effect::RecordWithdrawal { .. })));
    }

    #[test]
    fn test_withdraw_zeroes_balance() {
        let mut users = seeded(&[(1, 130)]);
        let effects = dispatcher().handle(&action(1, "withdraw"), &mut users, NOW);

        assert_eq!(users[&1].balance, 0);
        assert!(only_reply(&effects).contains("Amount: <b>130 points</b>"));
        assert_eq!(
            effects.last(),
            Some(&Effect::RecordWithdrawal {
                chat_id: 1,
                amount: 130,
                at: NOW
            })
        );
    }

    #[test]
    fn test_leaderboard_top_five_and_own_position() {
        let mut users = seeded(&[(1, 300), (2, 100), (3, 300), (4, 50), (5, 10), (6, 5)]);
        let effects = dispatcher().handle(&action(6, "leaderboard"), &mut users, NOW);
        let text = only_reply(&effects);

        let expected = "🏆 <b>Top Earners</b>\n\n\
                        1. <b>user1</b>: 300 points\n\
                        2. <b>user3</b>: 300 points\n\
                        3. <b>user2</b>: 100 points\n\
                        4. <b>user4</b>: 50 points\n\
                        5. <b>user5</b>: 10 points\n\
                        \nYour position: <b>#6</b> with 5 points";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_leaderboard_omits_position_inside_top() {
        let mut users = seeded(&[(1, 300), (2, 100)]);
        let effects = dispatcher().handle(&action(2, "leaderboard"), &mut users, NOW);
        assert!(!only_reply(&effects).contains("Your position"));
    }

    #[test]
    fn test_referrals_view() {
        let mut users = seeded(&[(1, 0)]);
        users[&1].referral_count = 3;
        let effects = dispatcher().handle(&action(1, "referrals"), &mut users, NOW);
        let text = only_reply(&effects);

        assert!(text.contains("Your code: <code>CODE1</code>"));
        assert!(text.contains("Your referrals: <b>3</b>"));
        assert!(text.contains("https://t.me/PointsBot?start=CODE1"));
    }

    #[test]
    fn test_unknown_input_changes_nothing() {
        let d = dispatcher();
        let mut users = seeded(&[(1, 40)]);
        users[&1].display_name = "Old Name".to_string();
        let mut expected = users.clone();
        // Refreshing the name from the sender is the only allowed mutation
        expected[&1].display_name = "user1".to_string();

        let effects = d.handle(&message(1, "what is this"), &mut users, NOW);
        assert_eq!(only_reply(&effects), messages::unrecognized_command());
        assert_eq!(users, expected);

        let effects = d.handle(&action(1, "steal_points"), &mut users, NOW);
        assert_eq!(only_reply(&effects), "Unknown command. Please try again.");
        assert_eq!(users, expected);
    }

    #[test]
    fn test_event_without_sender_keeps_stored_name() {
        let d = dispatcher();
        let mut users = seeded(&[(1, 0)]);
        users[&1].display_name = "Ann".to_string();

        let anonymous = InboundEvent::Message {
            chat_id: 1,
            text: "/balance".to_string(),
            sender_name: String::new(),
        };
        d.handle(&anonymous, &mut users, NOW);
        assert_eq!(users[&1].display_name, "Ann");

        let anonymous = InboundEvent::Message {
            chat_id: 2,
            text: "/start".to_string(),
            sender_name: "   ".to_string(),
        };
        let effects = d.handle(&anonymous, &mut users, NOW);
        assert_eq!(users[&2].display_name, "User");
        assert!(only_reply(&effects).contains("Welcome, User!"));
    }

    #[test]
    fn test_command_with_extra_words_or_foreign_mention_is_unrecognized() {
        let d = dispatcher();
        let mut users = seeded(&[(1, 70)]);

        for text in ["/balance now please", "/help me", "/help@OtherBot"] {
            let effects = d.handle(&message(1, text), &mut users, NOW);
            assert_eq!(only_reply(&effects), messages::unrecognized_command(), "text {:?}", text);
        }
        assert_eq!(users[&1].balance, 70);
    }

    #[test]
    fn test_help_and_balance_commands() {
        let d = dispatcher();
        let mut users = seeded(&[(1, 70)]);

        let effects = d.handle(&message(1, "/balance"), &mut users, NOW);
        assert!(only_reply(&effects).contains("Points: <b>70</b>"));

        let effects = d.handle(&message(1, "/help@PointsBot"), &mut users, NOW);
        assert_eq!(only_reply(&effects), messages::help());
    }
}
