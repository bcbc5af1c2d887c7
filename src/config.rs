//! Session configuration from the environment

use crate::availability::{DetectPolicy, DEFAULT_POLL_CEILING, DEFAULT_POLL_INTERVAL};
use crate::provider::{CompletionOptions, Model};
use crate::state_machine::{ChatContext, UnavailablePolicy, DEFAULT_SYSTEM_PROMPT};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Which provider the demo binary exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Echo,
    /// No provider at all, to exercise the unavailable path
    None,
}

/// Configuration for a chat session
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub system_prompt: String,
    pub options: CompletionOptions,
    pub unavailable_policy: UnavailablePolicy,
    pub detect_policy: DetectPolicy,
    pub provider: ProviderKind,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: CompletionOptions::default(),
            unavailable_policy: UnavailablePolicy::default(),
            detect_policy: DetectPolicy::default(),
            provider: ProviderKind::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; unset variables keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(prompt) = lookup("WINDOW_CHAT_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        if let Some(temperature) = parse::<f32>(&lookup, "WINDOW_CHAT_TEMPERATURE")? {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError {
                    var: "WINDOW_CHAT_TEMPERATURE",
                    reason: format!("{temperature} is outside 0..=2"),
                });
            }
            config.options.temperature = Some(temperature);
        }
        if let Some(max_tokens) = parse::<u32>(&lookup, "WINDOW_CHAT_MAX_TOKENS")? {
            config.options.max_tokens = Some(max_tokens);
        }
        if let Some(model) = parse::<Model>(&lookup, "WINDOW_CHAT_MODEL")? {
            config.options.model = Some(model);
        }
        if let Some(stops) = lookup("WINDOW_CHAT_STOP_SEQUENCES") {
            config.options.stop_sequences = stops
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(echo) = parse::<bool>(&lookup, "WINDOW_CHAT_ECHO_UNAVAILABLE")? {
            config.unavailable_policy = if echo {
                UnavailablePolicy::EchoUserMessage
            } else {
                UnavailablePolicy::Drop
            };
        }

        let interval = parse::<u64>(&lookup, "WINDOW_CHAT_POLL_INTERVAL_MS")?
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);
        let ceiling = parse::<u64>(&lookup, "WINDOW_CHAT_POLL_CEILING_MS")?
            .map_or(DEFAULT_POLL_CEILING, Duration::from_millis);
        config.detect_policy = match lookup("WINDOW_CHAT_DETECT").as_deref() {
            None | Some("poll") => DetectPolicy::BoundedPoll { interval, ceiling },
            Some("resolve") => DetectPolicy::AsyncResolve,
            Some(other) => {
                return Err(ConfigError {
                    var: "WINDOW_CHAT_DETECT",
                    reason: format!("expected 'poll' or 'resolve', got '{other}'"),
                })
            }
        };

        config.provider = match lookup("WINDOW_CHAT_PROVIDER").as_deref() {
            None | Some("echo") => ProviderKind::Echo,
            Some("none") => ProviderKind::None,
            Some(other) => {
                return Err(ConfigError {
                    var: "WINDOW_CHAT_PROVIDER",
                    reason: format!("expected 'echo' or 'none', got '{other}'"),
                })
            }
        };

        Ok(config)
    }

    /// Reducer context for a new session
    pub fn context(&self, session_id: impl Into<String>) -> ChatContext {
        ChatContext {
            session_id: session_id.into(),
            system_prompt: self.system_prompt.clone(),
            options: self.options.clone(),
            unavailable_policy: self.unavailable_policy,
        }
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}
