//! Effects produced by state transitions

use super::state::RequestId;
use crate::notify::Notification;
use crate::provider::CompletionRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Invoke the provider and stream results back as events
    RequestCompletion {
        request_id: RequestId,
        request: CompletionRequest,
    },

    /// Stop forwarding results of a superseded request
    CancelCompletion { request_id: RequestId },

    /// Show a notification to the user
    Notify(Notification),

    /// Transcript or loading flag changed; render a fresh snapshot
    PublishSnapshot,
}

impl Effect {
    pub fn notify(notification: Notification) -> Self {
        Effect::Notify(notification)
    }

    pub fn request_completion(request_id: RequestId, request: CompletionRequest) -> Self {
        Effect::RequestCompletion {
            request_id,
            request,
        }
    }
}
