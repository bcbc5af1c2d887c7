//! Provider availability detection
//!
//! Detection runs once per session and always ends in exactly one of
//! [`Availability::Available`] or [`Availability::Unavailable`].

use crate::provider::CompletionProvider;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_CEILING: Duration = Duration::from_millis(1000);

/// Something that may hand out a provider handle
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Check once for the capability
    async fn probe(&self) -> Option<Arc<dyn CompletionProvider>>;
}

/// Suspends detection between polls
#[async_trait]
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Timer backed by the tokio clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Source with a fixed answer
pub struct StaticSource {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl StaticSource {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderSource for StaticSource {
    async fn probe(&self) -> Option<Arc<dyn CompletionProvider>> {
        self.provider.clone()
    }
}

/// How to wait for the capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectPolicy {
    /// Ask the source once and accept its answer
    AsyncResolve,
    /// Re-probe every `interval` until `ceiling` has elapsed
    BoundedPoll { interval: Duration, ceiling: Duration },
}

impl Default for DetectPolicy {
    fn default() -> Self {
        DetectPolicy::BoundedPoll {
            interval: DEFAULT_POLL_INTERVAL,
            ceiling: DEFAULT_POLL_CEILING,
        }
    }
}

/// Terminal outcome of detection
#[derive(Clone)]
pub enum Availability {
    Available(Arc<dyn CompletionProvider>),
    Unavailable,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn provider(&self) -> Option<Arc<dyn CompletionProvider>> {
        match self {
            Availability::Available(provider) => Some(Arc::clone(provider)),
            Availability::Unavailable => None,
        }
    }
}

impl fmt::Debug for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available(provider) => {
                f.debug_tuple("Available").field(&provider.name()).finish()
            }
            Availability::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Detect the provider according to `policy`
pub async fn detect(
    source: &dyn ProviderSource,
    policy: DetectPolicy,
    timer: &dyn Timer,
) -> Availability {
    let outcome = match policy {
        DetectPolicy::AsyncResolve => source.probe().await,
        DetectPolicy::BoundedPoll { interval, ceiling } => {
            poll(source, interval, ceiling, timer).await
        }
    };

    match outcome {
        Some(provider) => {
            tracing::info!(provider = %provider.name(), ?policy, "Provider detected");
            Availability::Available(provider)
        }
        None => {
            tracing::warn!(?policy, "Provider not detected");
            Availability::Unavailable
        }
    }
}

async fn poll(
    source: &dyn ProviderSource,
    interval: Duration,
    ceiling: Duration,
    timer: &dyn Timer,
) -> Option<Arc<dyn CompletionProvider>> {
    let mut elapsed = Duration::ZERO;
    loop {
        if let Some(provider) = source.probe().await {
            return Some(provider);
        }
        // A zero interval could never reach the ceiling
        if interval.is_zero() || elapsed >= ceiling {
            return None;
        }
        // The last wait is cut short so the ceiling is never overrun
        let wait = interval.min(ceiling - elapsed);
        timer.sleep(wait).await;
        elapsed += wait;
        tracing::debug!(elapsed_ms = %elapsed.as_millis(), "Polling for provider");
    }
}
