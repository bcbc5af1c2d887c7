//! window.ai chat
//!
//! Forwards chat messages to an injected completion provider and merges the
//! streamed reply into a running transcript.

pub mod availability;
pub mod config;
pub mod notify;
pub mod provider;
pub mod runtime;
pub mod state_machine;
pub mod terminal;

pub use availability::{
    detect, Availability, DetectPolicy, ProviderSource, StaticSource, Timer, TokioTimer,
};
pub use config::{ChatConfig, ConfigError, ProviderKind};
pub use notify::{DedupNotifier, Notification, Notifier};
pub use provider::{CompletionProvider, Message, Role};
pub use runtime::{start_session, ChatHandle, ChatUpdate, RuntimeError};
pub use state_machine::{transition, ChatContext, ChatState, Event};
