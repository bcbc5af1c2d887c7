//! Adapter from callback-style providers to an ordered result stream

use super::{ProviderError, ResultStream, StreamOutput};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sending half handed to a provider that reports results through a callback
///
/// Dropping every clone ends the stream.
#[derive(Debug, Clone)]
pub struct StreamCallback {
    tx: mpsc::UnboundedSender<Result<StreamOutput, ProviderError>>,
}

/// Create a callback and the stream it feeds
///
/// Results are yielded in the order the callback is invoked.
pub fn callback_stream() -> (StreamCallback, ResultStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream: ResultStream = Box::pin(UnboundedReceiverStream::new(rx));
    (StreamCallback { tx }, stream)
}

impl StreamCallback {
    /// Report one invocation of the provider callback
    ///
    /// An error takes precedence over a result. An invocation carrying
    /// neither is ignored. Fails once the consumer has gone away.
    pub fn on_stream_result(
        &self,
        result: Option<StreamOutput>,
        error: Option<String>,
    ) -> Result<(), ProviderError> {
        let item = match (result, error) {
            (_, Some(error)) => Err(ProviderError::stream(error)),
            (Some(output), None) => Ok(output),
            (None, None) => {
                tracing::debug!("Ignoring empty stream callback");
                return Ok(());
            }
        };
        self.tx.send(item).map_err(|_| ProviderError::cancelled())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
