//! Chat runtime executor

use super::ChatUpdate;
use crate::availability::Availability;
use crate::notify::Notifier;
use crate::provider::{CompletionOptions, CompletionProvider, CompletionRequest};
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, RequestId};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Owns the chat state and executes effects
pub struct ChatRuntime {
    context: ChatContext,
    state: ChatState,
    provider: Option<Arc<dyn CompletionProvider>>,
    notifier: Arc<dyn Notifier>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that dropping every handle ends the session
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<ChatUpdate>,
    detection: Option<oneshot::Receiver<Availability>>,
    /// Token for the request currently streaming
    in_flight: Option<(RequestId, CancellationToken)>,
}

impl ChatRuntime {
    pub fn new(
        context: ChatContext,
        notifier: Arc<dyn Notifier>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<ChatUpdate>,
        detection: oneshot::Receiver<Availability>,
    ) -> Self {
        Self {
            context,
            state: ChatState::new(),
            provider: None,
            notifier,
            event_rx,
            event_tx,
            broadcast_tx,
            detection: Some(detection),
            in_flight: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting chat runtime");
        let mut detection = self.detection.take();

        loop {
            tokio::select! {
                availability = resolve(&mut detection), if detection.is_some() => {
                    detection = None;
                    self.provider = availability.provider();
                    let available = self.provider.is_some();
                    if let Err(e) = self.process_event(Event::ProviderResolved { available }) {
                        tracing::warn!(error = %e, "Detection outcome refused");
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(error = %e, "Event refused");
                    }
                }
                else => break,
            }
        }

        if let Some((_, token)) = self.in_flight.take() {
            token.cancel();
        }
        tracing::info!("Chat runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), String> {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let request_id = current_event.request_id();

            // Pure state transition
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    let _ = self.broadcast_tx.send(ChatUpdate::Error {
                        message: e.to_string(),
                    });
                    return Err(e.to_string());
                }
            };

            if result.effects.is_empty() {
                if let Some(request_id) = request_id {
                    tracing::debug!(%request_id, "Ignoring event without effect");
                }
            }

            self.state = result.new_state;
            self.release_finished_request();

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Drop the token once the reducer has finished the request.
    /// Superseded requests are cancelled by `Effect::CancelCompletion`.
    fn release_finished_request(&mut self) {
        if self.state.active_request.is_none() {
            if let Some((_, token)) = self.in_flight.take() {
                token.cancel();
            }
        }
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::RequestCompletion {
                request_id,
                request,
            } => self.start_completion(request_id, request),

            Effect::CancelCompletion { request_id } => {
                match self.in_flight.take() {
                    Some((id, token)) if id == request_id => {
                        tracing::info!(%request_id, "Cancelling superseded request");
                        token.cancel();
                    }
                    other => self.in_flight = other,
                }
                None
            }

            Effect::Notify(notification) => {
                self.notifier.notify(&notification);
                None
            }

            Effect::PublishSnapshot => {
                // No subscribers is fine
                let _ = self.broadcast_tx.send(ChatUpdate::Snapshot {
                    messages: self.state.transcript.messages().to_vec(),
                    loading: self.state.loading,
                    streaming: self.state.active_request.is_some(),
                    provider: self.state.provider,
                });
                None
            }
        }
    }

    fn start_completion(
        &mut self,
        request_id: RequestId,
        request: CompletionRequest,
    ) -> Option<Event> {
        let Some(provider) = self.provider.clone() else {
            return Some(Event::CallRejected {
                request_id,
                message: "no provider available".to_string(),
            });
        };
        let Some(event_tx) = self.event_tx.upgrade() else {
            // Every handle is gone; nobody is left to see the reply
            return None;
        };

        tracing::info!(
            %request_id,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let token = CancellationToken::new();
        self.in_flight = Some((request_id, token.clone()));

        let options = self.context.options.clone();
        tokio::spawn(forward_stream(
            provider, request_id, request, options, event_tx, token,
        ));
        None
    }
}

/// Wait for the detection outcome; a dropped sender counts as unavailable
async fn resolve(detection: &mut Option<oneshot::Receiver<Availability>>) -> Availability {
    match detection {
        Some(rx) => rx.await.unwrap_or(Availability::Unavailable),
        None => std::future::pending().await,
    }
}

/// Call the provider and forward its stream as events, in order
async fn forward_stream(
    provider: Arc<dyn CompletionProvider>,
    request_id: RequestId,
    request: CompletionRequest,
    options: CompletionOptions,
    event_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let generated = tokio::select! {
        () = cancel.cancelled() => return,
        generated = provider.generate(&request, &options) => generated,
    };

    let mut stream = match generated {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(%request_id, error = %e, "Completion call rejected");
            let _ = event_tx
                .send(Event::CallRejected {
                    request_id,
                    message: e.message,
                })
                .await;
            return;
        }
    };

    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(%request_id, "Stream cancelled");
                return;
            }
            item = stream.next() => item,
        };

        let (event, last) = match item {
            Some(Ok(output)) => (Event::StreamResult { request_id, output }, false),
            Some(Err(e)) => (
                Event::StreamError {
                    request_id,
                    message: e.message,
                },
                true,
            ),
            None => (Event::StreamEnded { request_id }, true),
        };

        if event_tx.send(event).await.is_err() || last {
            return;
        }
    }
}
