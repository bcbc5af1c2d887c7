//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use crate::availability::{ProviderSource, Timer};
use crate::notify::{Notification, Notifier};
use crate::provider::{
    CompletionOptions, CompletionProvider, CompletionRequest, ProviderError, ResultStream,
    StreamOutput,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Provider
// ============================================================================

/// Scripted outcome of one generate call
#[allow(dead_code)]
pub enum MockReply {
    /// Yield these items, then end
    Stream(Vec<Result<StreamOutput, ProviderError>>),
    /// Yield these items, then stay open forever
    Open(Vec<Result<StreamOutput, ProviderError>>),
    /// Reject the call itself
    Reject(ProviderError),
}

/// Mock provider that replays queued replies
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<CompletionRequest>>,
    /// `Open` replies whose stream has not been dropped yet
    open: Arc<AtomicUsize>,
    opened: AtomicUsize,
}

/// Decrements the open count when the stream holding it is dropped
struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            open: Arc::new(AtomicUsize::new(0)),
            opened: AtomicUsize::new(0),
        }
    }

    /// Queue a reply streaming these chunks as message outputs
    pub fn queue_chunks(&self, chunks: &[&str]) {
        let items = chunks
            .iter()
            .map(|c| Ok(StreamOutput::message(*c)))
            .collect();
        self.queue(MockReply::Stream(items));
    }

    pub fn queue(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn opened_streams(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn generate(
        &self,
        request: &CompletionRequest,
        _options: &CompletionOptions,
    ) -> Result<ResultStream, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockReply::Reject(ProviderError::rejected("No mock reply queued")));
        match reply {
            MockReply::Stream(items) => Ok(stream::iter(items).boxed()),
            MockReply::Open(items) => {
                self.open.fetch_add(1, Ordering::SeqCst);
                self.opened.fetch_add(1, Ordering::SeqCst);
                let guard = OpenGuard(Arc::clone(&self.open));
                Ok(stream::iter(items)
                    .chain(stream::pending())
                    .map(move |item| {
                        let _open = &guard;
                        item
                    })
                    .boxed())
            }
            MockReply::Reject(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Mock Source
// ============================================================================

/// Source that turns up a provider after a number of failed probes
pub struct MockSource {
    provider: Option<Arc<dyn CompletionProvider>>,
    misses: usize,
    probes: AtomicUsize,
}

#[allow(dead_code)]
impl MockSource {
    pub fn available_after(misses: usize, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider: Some(provider),
            misses,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn never() -> Self {
        Self {
            provider: None,
            misses: 0,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderSource for MockSource {
    async fn probe(&self) -> Option<Arc<dyn CompletionProvider>> {
        let seen = self.probes.fetch_add(1, Ordering::SeqCst);
        if seen >= self.misses {
            self.provider.clone()
        } else {
            None
        }
    }
}

// ============================================================================
// Recording Timer
// ============================================================================

/// Timer that returns immediately and remembers what it was asked to sleep
#[derive(Default)]
pub struct RecordingTimer {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub fn total(&self) -> Duration {
        self.sleeps.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================================
// Recording Notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.shown().into_iter().map(|n| n.text).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.shown.lock().unwrap().push(notification.clone());
    }
}
