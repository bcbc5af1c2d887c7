//! Streaming echo provider for the terminal demo

use super::{
    callback_stream, CompletionOptions, CompletionProvider, CompletionRequest, ProviderError,
    ResultStream, Role, StreamOutput,
};
use async_trait::async_trait;
use std::time::Duration;

/// Replies with the latest user message, one word per chunk
pub struct EchoProvider {
    chunk_delay: Duration,
}

impl EchoProvider {
    pub fn new(chunk_delay: Duration) -> Self {
        Self { chunk_delay }
    }
}

/// Split text into word-sized fragments that concatenate back to the input
fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() && !current.trim().is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn generate(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<ResultStream, ProviderError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .ok_or_else(|| ProviderError::rejected("request has no user message"))?;

        let mut reply = format!("You said: {prompt}");
        if let Some(max) = options.max_tokens {
            // one word per token is close enough for an echo
            let words: Vec<&str> = reply.split_whitespace().collect();
            if words.len() > max as usize {
                reply = words[..max as usize].join(" ");
            }
        }

        let (callback, stream) = callback_stream();
        let delay = self.chunk_delay;
        tokio::spawn(async move {
            for chunk in split_chunks(&reply) {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if callback
                    .on_stream_result(Some(StreamOutput::message(chunk)), None)
                    .is_err()
                {
                    tracing::debug!("Echo stream consumer went away");
                    break;
                }
            }
        });
        Ok(stream)
    }

    fn name(&self) -> &str {
        "echo"
    }
}
