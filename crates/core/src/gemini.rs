//! Gemini Agent Runtime
//!
//! An `AgentRuntime` backed by the Gemini `streamGenerateContent` endpoint with
//! Google Search grounding enabled. The server-sent event stream is translated
//! into `AgentEvent`s: text chunks, search queries and usage become progress
//! events, and the chunk carrying a finish reason becomes the final response.

use crate::agent::{AgentEvent, AgentEventStream, AgentRuntime, Content, Part, Progress};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// --- Wire types for the streaming response ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    web_search_queries: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// A Gemini model instructed as an agent, with the `google_search` tool.
pub struct GeminiAgent {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    instruction: String,
}

impl GeminiAgent {
    /// Creates a new Gemini agent.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The Google API key sent as `x-goog-api-key`.
    /// * `api_base` - The API root, e.g. [`DEFAULT_API_BASE`].
    /// * `model` - The model identifier (e.g., "gemini-2.5-flash").
    /// * `instruction` - The system instruction that defines the agent.
    pub fn new(api_key: String, api_base: String, model: String, instruction: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_base,
            model,
            instruction,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl AgentRuntime for GeminiAgent {
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> Result<AgentEventStream> {
        debug!(%user_id, %session_id, model = %self.model, "Starting Gemini agent run");

        let body = json!({
            "systemInstruction": { "parts": [{ "text": self.instruction }] },
            "contents": [message],
            "tools": [{ "google_search": {} }],
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Gemini API returned {}: {}", status, text);
        }

        let mut bytes = response.bytes_stream().fuse();
        Ok(Box::pin(async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut accumulated = String::new();

            loop {
                let data = match next_event(&mut buffer) {
                    Some(data) => data,
                    None => match bytes.next().await {
                        Some(Ok(chunk)) => {
                            buffer.extend_from_slice(&chunk);
                            continue;
                        }
                        Some(Err(e)) => {
                            yield Err(anyhow::Error::new(e).context("Gemini stream interrupted"));
                            return;
                        }
                        // Flush whatever is left once the body ends.
                        None if !buffer.is_empty() => {
                            String::from_utf8_lossy(&std::mem::take(&mut buffer)).into_owned()
                        }
                        None => return,
                    },
                };

                let Some(chunk) = parse_event(&data) else {
                    continue;
                };
                match interpret_chunk(chunk, &mut accumulated) {
                    Ok(events) => {
                        for event in events {
                            let is_final = matches!(event, AgentEvent::Final(_));
                            yield Ok(event);
                            if is_final {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }))
    }
}

/// Pops the next complete SSE event (terminated by a blank line) off `buffer`.
fn next_event(buffer: &mut Vec<u8>) -> Option<String> {
    let (pos, delim_len) = [b"\r\n\r\n".as_slice(), b"\n\n".as_slice()]
        .iter()
        .filter_map(|delim| {
            buffer
                .windows(delim.len())
                .position(|w| w == *delim)
                .map(|pos| (pos, delim.len()))
        })
        .min_by_key(|(pos, _)| *pos)?;

    let event: Vec<u8> = buffer.drain(..pos + delim_len).take(pos).collect();
    Some(String::from_utf8_lossy(&event).into_owned())
}

/// Extracts and decodes the `data:` payload of one SSE event.
fn parse_event(event: &str) -> Option<StreamChunk> {
    let data: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str(&data.join("\n")) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            warn!(error = %e, "Skipping malformed Gemini stream chunk");
            None
        }
    }
}

/// Translates one response chunk into agent events.
///
/// Non-thought text is appended to `accumulated`; when the chunk carries a
/// finish reason, the accumulated text is moved into the final response.
fn interpret_chunk(chunk: StreamChunk, accumulated: &mut String) -> Result<Vec<AgentEvent>> {
    if let Some(error) = chunk.error {
        return Err(anyhow!(
            "Gemini API error ({}): {}",
            error.code,
            error.message
        ));
    }

    let mut events = Vec::new();

    if let Some(usage) = chunk.usage_metadata {
        events.push(AgentEvent::Progress(Progress::Usage {
            prompt_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        }));
    }

    let Some(candidate) = chunk.candidates.and_then(|c| c.into_iter().next()) else {
        return Ok(events);
    };

    if let Some(grounding) = candidate.grounding_metadata
        && !grounding.web_search_queries.is_empty()
    {
        events.push(AgentEvent::Progress(Progress::SearchQueries(
            grounding.web_search_queries,
        )));
    }

    if let Some(content) = candidate.content {
        for part in content.parts.iter().filter(|p| !p.thought) {
            if let Some(text) = part.as_text() {
                accumulated.push_str(text);
                events.push(AgentEvent::Progress(Progress::TextDelta(text.to_string())));
            }
        }
    }

    if let Some(reason) = candidate.finish_reason {
        debug!(finish_reason = %reason, "Gemini run finished");
        let parts = if accumulated.is_empty() {
            Vec::new()
        } else {
            vec![Part::text(std::mem::take(accumulated))]
        };
        events.push(AgentEvent::Final(Content {
            role: "model".to_string(),
            parts,
        }));
    }

    Ok(events)
}
