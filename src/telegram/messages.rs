//! Reply texts (HTML parse mode)
//!
//! User-provided names are escaped here; everything else is static or numeric.

use teloxide::utils::html::escape;

use crate::core::config::economy::{EARN_COOLDOWN_SECS, EARN_REWARD, MIN_WITHDRAWAL, REFERRAL_BONUS};

/// Deep link that starts the bot with a referral code
pub fn referral_link(bot_username: &str, code: &str) -> String {
    format!("https://t.me/{}?start={}", bot_username, code)
}

pub fn welcome(name: &str, code: &str, link: &str) -> String {
    format!(
        "👋 <b>Welcome, {}!</b>\n\n\
         Earn points, invite friends, and withdraw your earnings!\n\n\
         🔹 <b>Your Referral Code:</b> <code>{}</code>\n\
         🔹 <b>Your Referral Link:</b> <code>{}</code>\n\n\
         Use the buttons below to navigate through the bot features.",
        escape(name),
        escape(code),
        escape(link)
    )
}

/// Sent to the referrer when somebody joins with their code
pub fn new_referral(new_user_name: &str) -> String {
    format!(
        "🎉 <b>New Referral!</b>\n\n\
         User <b>{}</b> joined using your referral link.\n\n\
         <b>+{} points bonus added to your account!</b>",
        escape(new_user_name),
        REFERRAL_BONUS
    )
}

pub fn balance(balance: u64, referrals: u64) -> String {
    format!(
        "💳 <b>Your Balance</b>\n\n\
         Points: <b>{}</b>\n\
         Referrals: <b>{}</b>",
        balance, referrals
    )
}

pub fn help() -> String {
    format!(
        "❓ <b>Help Center</b>\n\n\
         💰 <b>Earn:</b> Get {} points every {} seconds\n\
         👥 <b>Refer:</b> Earn {} points per referral\n\
         🏧 <b>Withdraw:</b> Minimum {} points\n\n\
         Use the buttons below to navigate!",
        EARN_REWARD, EARN_COOLDOWN_SECS, REFERRAL_BONUS, MIN_WITHDRAWAL
    )
}

/// Reply to free text and unknown slash commands
pub fn unrecognized_command() -> String {
    "I don't understand that command. Please use the buttons below or try /start, /balance, or /help.".to_string()
}

/// Reply to callback data that maps to no action
pub fn unknown_action() -> String {
    "Unknown command. Please try again.".to_string()
}

pub fn earn_cooldown(remaining_secs: i64) -> String {
    format!(
        "⏳ <b>Please wait!</b>\n\n{} seconds before earning again.",
        remaining_secs
    )
}

pub fn earned(reward: u64, new_balance: u64) -> String {
    format!(
        "✅ <b>Points Earned!</b>\n\n\
         You earned <b>{} points</b>!\n\
         New balance: <b>{} points</b>\n\n\
         You can earn again in {} seconds.",
        reward, new_balance, EARN_COOLDOWN_SECS
    )
}

/// Numbered top list, plus the requester's own rank when it is not listed
pub fn leaderboard(top: &[(&str, u64)], own_position: Option<(usize, u64)>) -> String {
    let mut msg = String::from("🏆 <b>Top Earners</b>\n\n");
    for (i, (name, balance)) in top.iter().enumerate() {
        msg.push_str(&format!("{}. <b>{}</b>: {} points\n", i + 1, escape(name), balance));
    }

    if let Some((position, balance)) = own_position {
        msg.push_str(&format!(
            "\nYour position: <b>#{}</b> with {} points",
            position, balance
        ));
    }
    msg
}

pub fn referrals(code: &str, count: u64, link: &str) -> String {
    format!(
        "👥 <b>Referral System</b>\n\n\
         Your code: <code>{}</code>\n\
         Your referrals: <b>{}</b>\n\n\
         Share this link to invite friends:\n\
         <code>{}</code>\n\n\
         <b>Earn {} points per referral!</b>",
        escape(code),
        count,
        escape(link),
        REFERRAL_BONUS
    )
}

pub fn withdraw_shortfall(balance: u64) -> String {
    format!(
        "🏧 <b>Withdrawal</b>\n\n\
         Minimum: <b>{} points</b>\n\
         Your balance: <b>{} points</b>\n\n\
         You need <b>{} more points</b> to withdraw!",
        MIN_WITHDRAWAL,
        balance,
        MIN_WITHDRAWAL.saturating_sub(balance)
    )
}

pub fn withdraw_requested(amount: u64) -> String {
    format!(
        "🏧 <b>Withdrawal Requested!</b>\n\n\
         Amount: <b>{} points</b>\n\n\
         Our team will process your withdrawal shortly.\n\
         Thank you for your patience!",
        amount
    )
}
