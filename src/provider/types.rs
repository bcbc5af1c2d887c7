//! Common types for completion requests

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request sent to a completion provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
}

/// Models a provider may be asked to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "openai/gpt3.5")]
    Gpt3,
    #[serde(rename = "openai/gpt4")]
    Gpt4,
    #[serde(rename = "together/gpt-neoxt-20B")]
    GptNeo,
    #[serde(rename = "cohere/xlarge")]
    Cohere,
    #[serde(rename = "local")]
    Local,
}

impl Model {
    pub fn id(self) -> &'static str {
        match self {
            Model::Gpt3 => "openai/gpt3.5",
            Model::Gpt4 => "openai/gpt4",
            Model::GptNeo => "together/gpt-neoxt-20B",
            Model::Cohere => "cohere/xlarge",
            Model::Local => "local",
        }
    }

    pub fn all() -> &'static [Model] {
        &[
            Model::Gpt3,
            Model::Gpt4,
            Model::GptNeo,
            Model::Cohere,
            Model::Local,
        ]
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::all()
            .iter()
            .copied()
            .find(|m| m.id() == s)
            .ok_or_else(|| format!("unknown model '{s}'"))
    }
}

/// Sampling and streaming options for a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// Sampling temperature between 0 and 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Defaults to the provider's current model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(1000),
            stop_sequences: Vec::new(),
            model: None,
        }
    }
}

/// One partial result delivered by a streaming provider
///
/// Providers answer either with bare text or with a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamOutput {
    Text { text: String },
    Message { message: OutputMessage },
}

/// Message payload of a chat-style partial result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}

impl StreamOutput {
    pub fn text(s: impl Into<String>) -> Self {
        StreamOutput::Text { text: s.into() }
    }

    pub fn message(content: impl Into<String>) -> Self {
        StreamOutput::Message {
            message: OutputMessage {
                role: Some(Role::Assistant.as_str().to_string()),
                content: content.into(),
            },
        }
    }

    /// The incremental content carried by this fragment
    pub fn content(&self) -> &str {
        match self {
            StreamOutput::Text { text } => text,
            StreamOutput::Message { message } => &message.content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            StreamOutput::Text { text } => text,
            StreamOutput::Message { message } => message.content,
        }
    }
}
