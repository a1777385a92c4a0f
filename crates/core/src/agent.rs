//! Agent Runtime Abstraction
//!
//! The agent runtime turns a single user message into a stream of events that
//! ends in a final response. All reasoning and web-search behaviour lives behind
//! the `AgentRuntime` trait; this module only defines the event vocabulary and
//! the consumer that extracts the final answer.

use anyhow::Result;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::debug;

/// A single piece of message content.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set for model reasoning ("thought") parts.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: false,
        }
    }

    /// Returns the text when it is present and non-empty.
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// A message: a role plus ordered parts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// Builds the single-part user message sent for each query.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    /// The first text-bearing part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }
}

/// Informational events emitted while the agent is working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A chunk of model output text.
    TextDelta(String),
    /// The web-search queries the model issued.
    SearchQueries(Vec<String>),
    /// Token accounting reported by the provider.
    Usage {
        prompt_tokens: u32,
        output_tokens: u32,
    },
}

/// An event produced by the agent runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Progress(Progress),
    /// The agent's final response. Terminates the run.
    Final(Content),
}

/// A stream of events from a single agent run.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;

/// A hosted agent that can answer a message within a session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Starts a run for `message` and returns its event stream.
    async fn run(&self, user_id: &str, session_id: &str, message: Content)
    -> Result<AgentEventStream>;
}

/// Drives `events` until the first final response and returns its text.
///
/// Returns `Ok(None)` when the stream ends without a final event or when the
/// final event carries no text-bearing part. The first error item aborts
/// consumption and is returned as-is.
pub async fn final_text(mut events: AgentEventStream) -> Result<Option<String>> {
    while let Some(event) = events.next().await {
        match event? {
            AgentEvent::Final(content) => {
                return Ok(content.first_text().map(str::to_string));
            }
            AgentEvent::Progress(progress) => {
                debug!(?progress, "Agent thinking...");
            }
        }
    }
    Ok(None)
}
