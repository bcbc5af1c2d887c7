//! Line-oriented rendering for the terminal front end

use crate::notify::{Notification, NotificationKind, Notifier};
use crate::provider::{Message, Role};
use std::io::Write;

/// Turns successive transcript snapshots into incremental terminal output
#[derive(Debug, Default)]
pub struct TranscriptView {
    /// Bytes already printed for each message
    printed: Vec<usize>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print so the terminal matches `messages`
    pub fn render(&mut self, messages: &[Message]) -> String {
        let mut out = String::new();
        for (index, message) in messages.iter().enumerate() {
            match self.printed.get_mut(index) {
                None => {
                    out.push('\n');
                    out.push_str(prefix(message.role));
                    out.push_str(&message.content);
                    self.printed.push(message.content.len());
                }
                Some(done) => {
                    if let Some(rest) = message.content.get(*done..) {
                        out.push_str(rest);
                    }
                    *done = message.content.len();
                }
            }
        }
        out
    }
}

fn prefix(role: Role) -> &'static str {
    match role {
        Role::User => "you> ",
        Role::Assistant => "ai> ",
        Role::System => "system> ",
    }
}

/// Prints notifications on their own line
#[derive(Debug, Default)]
pub struct TerminalNotifier;

pub fn format_notification(notification: &Notification) -> String {
    let tag = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Error => "error",
        NotificationKind::Custom => "notice",
    };
    match &notification.link {
        Some(link) => format!("[{tag}] {} ({})", notification.text, link.href),
        None => format!("[{tag}] {}", notification.text),
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "\n{}", format_notification(notification));
        let _ = stdout.flush();
    }
}
