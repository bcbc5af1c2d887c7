//! Events that can occur in a chat session

use super::state::RequestId;
use crate::provider::StreamOutput;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Detection finished
    ProviderResolved { available: bool },

    // User events
    UserMessage { text: String },

    // Provider events, tagged with the request they belong to
    StreamResult {
        request_id: RequestId,
        output: StreamOutput,
    },
    StreamError {
        request_id: RequestId,
        message: String,
    },
    /// The generate call failed before any streaming
    CallRejected {
        request_id: RequestId,
        message: String,
    },
    /// The result stream is exhausted
    StreamEnded { request_id: RequestId },
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }

    /// Request the event belongs to, if any
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::StreamResult { request_id, .. }
            | Event::StreamError { request_id, .. }
            | Event::CallRejected { request_id, .. }
            | Event::StreamEnded { request_id } => Some(*request_id),
            Event::ProviderResolved { .. } | Event::UserMessage { .. } => None,
        }
    }
}
