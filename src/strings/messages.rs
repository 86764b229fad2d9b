//! # Messages
//!
//! Formatting helpers for user-facing messages and log lines.

/// Placeholder replaced with subscriber mentions when an article is delivered.
pub const SUBSCRIPTIONS_PLACEHOLDER: &str = "{subscriptions}";

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Wraps `text` in a markdown code block.
pub fn code_block(text: &str) -> String {
    format!("```Markdown\n{text}\n```")
}

/// Puts a zero-width space before every backtick so `text` cannot close the
/// code block it is shown in.
pub fn escape_code(text: &str) -> String {
    text.replace('`', &format!("{ZERO_WIDTH_SPACE}`"))
}

pub fn has_subscriptions_placeholder(template: &str) -> bool {
    template.contains(SUBSCRIPTIONS_PLACEHOLDER)
}

pub fn message_reset_log(link: &str) -> String {
    format!("Message reset for {link}")
}

pub fn message_recorded_log(link: &str) -> String {
    format!("New message recorded for {link}")
}
