//! One-shot user notifications
//!
//! Rendering is left to the front end; this module only describes what to
//! show and suppresses repeats of identified notifications.

use std::collections::HashSet;
use std::sync::Mutex;

pub const PROVIDER_DETECTED_ID: &str = "window-ai-detected";
pub const PROVIDER_NOT_DETECTED_ID: &str = "window-ai-not-detected";
pub const INSTALL_URL: &str = "https://windowai.io";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    /// Free-form content such as the installation prompt
    Custom,
}

/// External link shown with a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Identified notifications are shown at most once
    pub id: Option<String>,
    pub kind: NotificationKind,
    pub text: String,
    pub link: Option<Link>,
}

impl Notification {
    pub fn provider_detected() -> Self {
        Self {
            id: Some(PROVIDER_DETECTED_ID.to_string()),
            kind: NotificationKind::Success,
            text: "window.ai detected!".to_string(),
            link: None,
        }
    }

    pub fn install_prompt() -> Self {
        Self {
            id: Some(PROVIDER_NOT_DETECTED_ID.to_string()),
            kind: NotificationKind::Custom,
            text: "Please visit windowai.io to install window.ai".to_string(),
            link: Some(Link {
                label: "windowai.io".to_string(),
                href: INSTALL_URL.to_string(),
            }),
        }
    }

    pub fn stream_failed() -> Self {
        Self::error("window.ai streaming completion failed.")
    }

    pub fn generation_failed() -> Self {
        Self::error("window.ai generation completion failed.")
    }

    fn error(text: &str) -> Self {
        Self {
            id: None,
            kind: NotificationKind::Error,
            text: text.to_string(),
            link: None,
        }
    }
}

/// Surface that displays notifications to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Drops repeats of notifications whose id was already shown
pub struct DedupNotifier<N> {
    inner: N,
    shown: Mutex<HashSet<String>>,
}

impl<N: Notifier> DedupNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            shown: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

impl<N: Notifier> Notifier for DedupNotifier<N> {
    fn notify(&self, notification: &Notification) {
        if let Some(id) = &notification.id {
            let mut shown = self
                .shown
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if !shown.insert(id.clone()) {
                tracing::debug!(id = %id, "Suppressing repeated notification");
                return;
            }
        }
        self.inner.notify(notification);
    }
}
