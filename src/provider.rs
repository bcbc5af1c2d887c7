//! Completion provider abstraction
//!
//! The provider is an injected capability: the chat never looks it up from
//! ambient state.

mod callback;
mod echo;
mod error;
mod types;

pub use callback::{callback_stream, StreamCallback};
pub use echo::EchoProvider;
pub use error::{ProviderError, ProviderErrorKind};
pub use types::*;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;

/// Ordered, finite stream of partial results for one request
pub type ResultStream = BoxStream<'static, Result<StreamOutput, ProviderError>>;

/// Common interface for completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Start a streaming completion
    ///
    /// An `Err` here means the call itself was rejected; failures after
    /// streaming has begun arrive as `Err` items on the stream.
    async fn generate(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<ResultStream, ProviderError>;

    /// Human readable name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: CompletionProvider + ?Sized> CompletionProvider for Arc<T> {
    async fn generate(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<ResultStream, ProviderError> {
        (**self).generate(request, options).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for providers
pub struct LoggingProvider {
    inner: Arc<dyn CompletionProvider>,
    name: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl CompletionProvider for LoggingProvider {
    async fn generate(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<ResultStream, ProviderError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request, options).await;
        let duration = start.elapsed();

        match result {
            Ok(stream) => {
                tracing::info!(
                    provider = %self.name,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    "Completion stream opened"
                );
                let name = self.name.clone();
                Ok(stream
                    .inspect(move |item| match item {
                        Ok(output) => {
                            tracing::debug!(provider = %name, len = output.content().len(), "Stream chunk");
                        }
                        Err(e) => {
                            tracing::warn!(provider = %name, error = %e.message, "Stream reported error");
                        }
                    })
                    .boxed())
            }
            Err(e) => {
                tracing::error!(
                    provider = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    "Completion call rejected"
                );
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
