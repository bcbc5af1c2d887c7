//! window-chat - terminal front end for the window.ai chat
//!
//! Reads one message per line from stdin and renders the streamed transcript
//! on stdout. Logs go to stderr as JSON.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use window_chat::config::{ChatConfig, ProviderKind};
use window_chat::provider::{EchoProvider, LoggingProvider};
use window_chat::state_machine::ProviderStatus;
use window_chat::terminal::{TerminalNotifier, TranscriptView};
use window_chat::{
    start_session, ChatUpdate, CompletionProvider, DedupNotifier, StaticSource, TokioTimer,
};

const ECHO_CHUNK_DELAY: Duration = Duration::from_millis(60);
/// Upper bound on waiting for one reply to finish
const REPLY_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "window_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;
    let provider: Option<Arc<dyn CompletionProvider>> = match config.provider {
        ProviderKind::Echo => Some(Arc::new(LoggingProvider::new(Arc::new(EchoProvider::new(
            ECHO_CHUNK_DELAY,
        ))))),
        ProviderKind::None => None,
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(session = %session_id, detect = ?config.detect_policy, "Starting chat session");

    let (handle, mut updates) = start_session(
        config.context(session_id),
        Arc::new(StaticSource::new(provider)),
        config.detect_policy,
        Arc::new(TokioTimer),
        Arc::new(DedupNotifier::new(TerminalNotifier)),
    );
    let mut view = TranscriptView::new();

    // Detection is bounded, so input opens shortly
    wait_until(&mut updates, &mut view, |provider, _| {
        provider != ProviderStatus::Detecting
    })
    .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        handle.submit(line).await?;

        // Input stays closed while a reply is on its way
        wait_until(&mut updates, &mut view, |_, streaming| !streaming).await?;
    }
    println!();

    Ok(())
}

/// Render updates until a snapshot satisfies `done` or an event is refused
async fn wait_until(
    updates: &mut broadcast::Receiver<ChatUpdate>,
    view: &mut TranscriptView,
    done: impl Fn(ProviderStatus, bool) -> bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(result) = tokio::time::timeout(REPLY_TIMEOUT, render_until(updates, view, done)).await {
        result
    } else {
        tracing::warn!(timeout_secs = REPLY_TIMEOUT.as_secs(), "Gave up waiting for reply");
        Ok(())
    }
}

async fn render_until(
    updates: &mut broadcast::Receiver<ChatUpdate>,
    view: &mut TranscriptView,
    done: impl Fn(ProviderStatus, bool) -> bool,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match updates.recv().await {
            Ok(ChatUpdate::Snapshot {
                messages,
                streaming,
                provider,
                ..
            }) => {
                let mut stdout = std::io::stdout().lock();
                write!(stdout, "{}", view.render(&messages))?;
                stdout.flush()?;
                if done(provider, streaming) {
                    return Ok(());
                }
            }
            Ok(ChatUpdate::Error { message }) => {
                println!("\n[error] {message}");
                return Ok(());
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer fell behind");
            }
            Err(e @ broadcast::error::RecvError::Closed) => return Err(e.into()),
        }
    }
}
