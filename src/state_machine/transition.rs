//! Pure state transition function

use super::state::{ChatContext, ChatState, ProviderStatus, RequestId, UnavailablePolicy};
use super::{Effect, Event};
use crate::notify::Notification;
use crate::provider::CompletionRequest;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot send an empty message")]
    EmptyMessage,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::ProviderResolved { available } => Ok(provider_resolved(state, available)),

        Event::UserMessage { text } => {
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            if state.provider == ProviderStatus::Available {
                Ok(submit(state, context, text))
            } else {
                Ok(submit_without_provider(state, context, text))
            }
        }

        // Anything tagged with a superseded request is discarded
        Event::StreamResult { request_id, .. }
        | Event::StreamError { request_id, .. }
        | Event::CallRejected { request_id, .. }
        | Event::StreamEnded { request_id }
            if !state.is_active(request_id) =>
        {
            Ok(TransitionResult::new(state.clone()))
        }

        Event::StreamResult { output, .. } => {
            let mut new_state = state.clone();
            new_state.loading = false;
            new_state.transcript.merge_partial(output.content());
            Ok(TransitionResult::new(new_state).with_effect(Effect::PublishSnapshot))
        }

        Event::StreamError { .. } => Ok(fail_request(state, Notification::stream_failed())),

        Event::CallRejected { .. } => Ok(fail_request(state, Notification::generation_failed())),

        Event::StreamEnded { .. } => {
            let mut new_state = state.clone();
            new_state.finish_request();
            Ok(TransitionResult::new(new_state).with_effect(Effect::PublishSnapshot))
        }
    }
}

fn provider_resolved(state: &ChatState, available: bool) -> TransitionResult {
    if state.provider != ProviderStatus::Detecting {
        // Detection runs once per session
        return TransitionResult::new(state.clone());
    }

    let mut new_state = state.clone();
    let notification = if available {
        new_state.provider = ProviderStatus::Available;
        Notification::provider_detected()
    } else {
        new_state.provider = ProviderStatus::Unavailable;
        Notification::install_prompt()
    };
    TransitionResult::new(new_state)
        .with_effect(Effect::notify(notification))
        .with_effect(Effect::PublishSnapshot)
}

fn submit(state: &ChatState, context: &ChatContext, text: String) -> TransitionResult {
    let mut new_state = state.clone();

    // A new send supersedes whatever is still streaming
    let superseded: Option<RequestId> = new_state.active_request.take();

    new_state.transcript.push_user(text);
    new_state.loading = true;
    let request_id = new_state.allocate_request();
    new_state.active_request = Some(request_id);

    let request = CompletionRequest {
        messages: new_state
            .transcript
            .to_request_messages(&context.system_prompt),
    };

    TransitionResult::new(new_state)
        .with_effects(
            superseded.map(|request_id| Effect::CancelCompletion { request_id }),
        )
        .with_effect(Effect::PublishSnapshot)
        .with_effect(Effect::request_completion(request_id, request))
}

fn submit_without_provider(
    state: &ChatState,
    context: &ChatContext,
    text: String,
) -> TransitionResult {
    let prompt = Effect::notify(Notification::install_prompt());
    match context.unavailable_policy {
        UnavailablePolicy::EchoUserMessage => {
            let mut new_state = state.clone();
            new_state.transcript.push_user(text);
            TransitionResult::new(new_state)
                .with_effect(Effect::PublishSnapshot)
                .with_effect(prompt)
        }
        UnavailablePolicy::Drop => TransitionResult::new(state.clone())
            .with_effect(Effect::PublishSnapshot)
            .with_effect(prompt),
    }
}

fn fail_request(state: &ChatState, notification: Notification) -> TransitionResult {
    let mut new_state = state.clone();
    new_state.finish_request();
    TransitionResult::new(new_state)
        .with_effect(Effect::notify(notification))
        .with_effect(Effect::PublishSnapshot)
}
