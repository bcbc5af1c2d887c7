//! Runtime for executing a chat session
//!
//! One task owns the chat state and applies events in arrival order;
//! provider streams run in their own tasks and only send events back.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;

use crate::availability::{detect, DetectPolicy, ProviderSource, Timer};
use crate::notify::Notifier;
use crate::provider::Message;
use crate::state_machine::{ChatContext, Event, ProviderStatus};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::Instrument;

/// Updates sent to the front end
#[derive(Debug, Clone)]
pub enum ChatUpdate {
    /// Full view of the chat after a change
    Snapshot {
        messages: Vec<Message>,
        /// Waiting for the first result of the active request
        loading: bool,
        /// A request is still streaming
        streaming: bool,
        provider: ProviderStatus,
    },
    /// An event was refused
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("chat session has shut down")]
    Closed,
}

/// Handle to interact with a running chat session
///
/// The session stops once every handle is dropped.
#[derive(Clone)]
pub struct ChatHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<ChatUpdate>,
}

impl ChatHandle {
    /// Send a user message
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.event_tx
            .send(Event::user_message(text))
            .await
            .map_err(|_| RuntimeError::Closed)
    }

    /// Subscribe to chat updates
    pub fn subscribe(&self) -> broadcast::Receiver<ChatUpdate> {
        self.broadcast_tx.subscribe()
    }
}

/// Start a chat session
///
/// Detection runs in the background; messages sent before it finishes are
/// treated as if no provider were present. The returned receiver is
/// subscribed before anything runs, so it sees every update.
pub fn start_session(
    context: ChatContext,
    source: Arc<dyn ProviderSource>,
    policy: DetectPolicy,
    timer: Arc<dyn Timer>,
    notifier: Arc<dyn Notifier>,
) -> (ChatHandle, broadcast::Receiver<ChatUpdate>) {
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, updates) = broadcast::channel(128);
    let (detected_tx, detected_rx) = oneshot::channel();

    tokio::spawn(async move {
        let availability = detect(source.as_ref(), policy, timer.as_ref()).await;
        // The session may already be gone
        let _ = detected_tx.send(availability);
    });

    let span = tracing::info_span!("chat", session = %context.session_id);
    let runtime = ChatRuntime::new(
        context,
        notifier,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx.clone(),
        detected_rx,
    );

    tokio::spawn(runtime.run().instrument(span));

    (
        ChatHandle {
            event_tx,
            broadcast_tx,
        },
        updates,
    )
}
