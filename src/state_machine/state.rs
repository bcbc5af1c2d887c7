//! Chat state types

use crate::provider::{CompletionOptions, Message, Role};
use std::fmt;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ============================================================================
// Transcript
// ============================================================================

/// How a partial result was folded into the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First fragment of a reply: a new assistant message was appended
    Appended,
    /// Continuation: the fragment was concatenated onto the last message
    Extended,
}

/// Ordered list of visible chat messages
///
/// Append-only, except that the content of a trailing assistant message
/// grows while its reply streams in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Fold one streamed fragment into the transcript
    ///
    /// Decided only by the role of the last message: a trailing assistant
    /// message is extended, anything else starts a new assistant message.
    pub fn merge_partial(&mut self, content: &str) -> MergeOutcome {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_str(content);
                MergeOutcome::Extended
            }
            _ => {
                self.messages.push(Message::assistant(content));
                MergeOutcome::Appended
            }
        }
    }

    /// Messages to send: the system prompt followed by the whole transcript
    pub fn to_request_messages(&self, system_prompt: &str) -> Vec<Message> {
        std::iter::once(Message::system(system_prompt))
            .chain(self.messages.iter().cloned())
            .collect()
    }
}

// ============================================================================
// Chat State
// ============================================================================

/// Identifies one provider invocation within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Outcome of provider detection as seen by the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    #[default]
    Detecting,
    Available,
    Unavailable,
}

/// Full chat state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub transcript: Transcript,
    /// Set while waiting for the first result of the active request
    pub loading: bool,
    pub provider: ProviderStatus,
    /// The only request whose results are merged
    pub active_request: Option<RequestId>,
    next_request: u64,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: ProviderStatus) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    pub fn is_active(&self, request_id: RequestId) -> bool {
        self.active_request == Some(request_id)
    }

    /// Allocate the id for a new request
    pub(crate) fn allocate_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Finish the active request and clear the busy flag
    pub(crate) fn finish_request(&mut self) {
        self.active_request = None;
        self.loading = false;
    }
}

// ============================================================================
// Context
// ============================================================================

/// What to do with a message sent while no provider is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnavailablePolicy {
    /// Record the user's message anyway
    #[default]
    EchoUserMessage,
    /// Leave the transcript untouched
    Drop,
}

/// Immutable settings for one chat session
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub session_id: String,
    pub system_prompt: String,
    pub options: CompletionOptions,
    pub unavailable_policy: UnavailablePolicy,
}

impl ChatContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: CompletionOptions::default(),
            unavailable_policy: UnavailablePolicy::default(),
        }
    }

    pub fn with_unavailable_policy(mut self, policy: UnavailablePolicy) -> Self {
        self.unavailable_policy = policy;
        self
    }
}
