//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::provider::{Message, Role, StreamOutput};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ChatContext {
    ChatContext::new("prop-session")
}

/// Apply events in order, skipping rejected ones
fn run(state: ChatState, events: Vec<Event>) -> ChatState {
    let context = test_context();
    events.into_iter().fold(state, |state, event| {
        match transition(&state, &context, event) {
            Ok(result) => result.new_state,
            Err(_) => state,
        }
    })
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ?+]{0,12}"
}

fn arb_output() -> impl Strategy<Value = StreamOutput> {
    prop_oneof![
        arb_text().prop_map(StreamOutput::text),
        arb_text().prop_map(StreamOutput::message),
    ]
}

fn arb_request_id() -> impl Strategy<Value = RequestId> {
    (0u64..6).prop_map(RequestId)
}

fn arb_provider_status() -> impl Strategy<Value = ProviderStatus> {
    prop_oneof![
        Just(ProviderStatus::Detecting),
        Just(ProviderStatus::Available),
        Just(ProviderStatus::Unavailable),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        any::<bool>().prop_map(|available| Event::ProviderResolved { available }),
        arb_text().prop_map(|text| Event::UserMessage { text }),
        (arb_request_id(), arb_output())
            .prop_map(|(request_id, output)| Event::StreamResult { request_id, output }),
        (arb_request_id(), arb_text())
            .prop_map(|(request_id, message)| Event::StreamError { request_id, message }),
        (arb_request_id(), arb_text())
            .prop_map(|(request_id, message)| Event::CallRejected { request_id, message }),
        arb_request_id().prop_map(|request_id| Event::StreamEnded { request_id }),
    ]
}

/// A reachable state: some status plus a history of events
fn arb_state() -> impl Strategy<Value = ChatState> {
    (
        arb_provider_status(),
        proptest::collection::vec(arb_event(), 0..12),
    )
        .prop_map(|(status, events)| run(ChatState::with_provider(status), events))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// The transcript only grows, and only its last message may change
    #[test]
    fn prop_transcript_never_shrinks(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            let before = state.transcript.messages();
            let after = result.new_state.transcript.messages();
            prop_assert!(after.len() >= before.len());

            if let Some((last, earlier)) = before.split_last() {
                prop_assert_eq!(&after[..earlier.len()], earlier);
                let same_slot = &after[earlier.len()];
                prop_assert_eq!(same_slot.role, last.role);
                prop_assert!(same_slot.content.starts_with(&last.content));
            }
        }
    }

    #[test]
    fn prop_system_message_never_stored(state in arb_state()) {
        prop_assert!(state
            .transcript
            .messages()
            .iter()
            .all(|m| m.role != Role::System));
    }

    #[test]
    fn prop_stale_events_ignored(state in arb_state(), event in arb_event()) {
        if let Some(request_id) = event.request_id() {
            if !state.is_active(request_id) {
                let result = transition(&state, &test_context(), event).unwrap();
                prop_assert_eq!(result.new_state, state);
                prop_assert!(result.effects.is_empty());
            }
        }
    }

    /// Exactly one user message is appended before the provider is invoked
    #[test]
    fn prop_submit_appends_one_user_message(state in arb_state(), text in "[a-z]{1,10}") {
        let mut state = state;
        state.provider = ProviderStatus::Available;
        let result = transition(&state, &test_context(), Event::user_message(text.clone())).unwrap();

        prop_assert_eq!(result.new_state.transcript.len(), state.transcript.len() + 1);
        prop_assert_eq!(result.new_state.transcript.last(), Some(&Message::user(text)));
        prop_assert!(result.new_state.loading);

        let request = result.effects.iter().find_map(|e| match e {
            Effect::RequestCompletion { request, .. } => Some(request.clone()),
            _ => None,
        });
        let request = request.expect("completion requested");
        prop_assert_eq!(request.messages[0].role, Role::System);
        prop_assert_eq!(&request.messages[1..], result.new_state.transcript.messages());
    }

    /// Deltas concatenate into one assistant message in emission order
    #[test]
    fn prop_chunks_concatenate(chunks in proptest::collection::vec(arb_text(), 1..8)) {
        let context = test_context();
        let state = ChatState::with_provider(ProviderStatus::Available);
        let state = transition(&state, &context, Event::user_message("q")).unwrap().new_state;
        let request_id = state.active_request.unwrap();

        let events = chunks
            .iter()
            .map(|c| Event::StreamResult { request_id, output: StreamOutput::text(c.clone()) })
            .collect();
        let state = run(state, events);

        prop_assert_eq!(state.transcript.len(), 2);
        prop_assert_eq!(state.transcript.last(), Some(&Message::assistant(chunks.concat())));
        prop_assert!(!state.loading);
    }

    #[test]
    fn prop_error_keeps_message_count(state in arb_state(), message in arb_text()) {
        if let Some(request_id) = state.active_request {
            let result = transition(
                &state,
                &test_context(),
                Event::StreamError { request_id, message },
            ).unwrap();
            prop_assert_eq!(result.new_state.transcript.len(), state.transcript.len());
            prop_assert!(!result.new_state.loading);
        }
    }

    #[test]
    fn prop_empty_continuation_is_noop(state in arb_state()) {
        let ends_in_assistant = state
            .transcript
            .last()
            .is_some_and(|m| m.role == Role::Assistant);
        if let (Some(request_id), true) = (state.active_request, ends_in_assistant) {
            let result = transition(
                &state,
                &test_context(),
                Event::StreamResult { request_id, output: StreamOutput::text("") },
            ).unwrap();
            prop_assert_eq!(result.new_state.transcript, state.transcript);
        }
    }
}
