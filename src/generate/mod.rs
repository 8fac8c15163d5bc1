//! Answer generation
//!
//! Streams grounded answers from an Ollama `/api/generate` endpoint. The
//! retrieved context is folded into the prompt; the response arrives as
//! newline-delimited JSON chunks that are forwarded token by token over a
//! channel, so callers can print fragments as they arrive.

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::store::QueryResult;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

/// Channel depth for in-flight answer fragments
const STREAM_BUFFER: usize = 32;

/// Build the grounded prompt for a question
///
/// When `context` is empty the document section is omitted entirely and the
/// model answers from its own knowledge.
pub fn build_prompt(query: &str, context: &[QueryResult]) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant. Answer the user's question based on the following information.\n\n",
    );

    if !context.is_empty() {
        prompt.push_str("Relevant documents:\n");
        for result in context {
            prompt.push_str(&format!("Document: {}\n", result.source_name));
            prompt.push_str(&format!("Content: {}\n\n", result.content));
        }
    }

    prompt.push_str(&format!("User question: {}\n", query));
    prompt.push_str("Give an accurate and detailed answer based on the information above.");
    prompt
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repeat_penalty: f32,
    num_predict: u32,
}

/// One NDJSON line of an Ollama generate stream
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the Ollama generation API
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GenerationClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        // No request timeout on the client itself; streams stay open for the
        // whole answer. Stalls are caught per-chunk in the reader task.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Whether the backend answers at all (used by status reporting)
    pub async fn is_reachable(&self) -> bool {
        match self.base_url.join("api/tags") {
            Ok(url) => match self.client.get(url).send().await {
                Ok(resp) => resp.status().is_success(),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Start a streaming completion for the given prompt
    ///
    /// Returns once the response headers arrive; fragments are then produced
    /// by a background task until the model reports completion, an error
    /// occurs, or the returned stream is dropped.
    pub async fn complete_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<AnswerStream> {
        let url = self.base_url.join("api/generate")?;
        let request = GenerateRequest {
            model: &config.model,
            prompt,
            stream: true,
            options: GenerateOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                repeat_penalty: config.repeat_penalty,
                num_predict: config.max_tokens,
            },
        };

        debug!("Requesting completion from {} ({})", url, config.model);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::GenerationConnect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerationStream(format!(
                "backend returned {}: {}",
                status,
                body.trim()
            )));
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let timeout_secs = config.timeout_secs;
        tokio::spawn(forward_stream(response, tx, timeout_secs));

        Ok(AnswerStream { rx })
    }
}

/// Read the NDJSON body and forward answer fragments over the channel
///
/// A send failure means the receiver was dropped; the task stops and the
/// HTTP connection closes, cancelling the generation.
async fn forward_stream(
    response: reqwest::Response,
    tx: mpsc::Sender<Result<String>>,
    timeout_secs: u64,
) {
    let mut body = response.bytes_stream();
    let mut buffer = String::new();

    loop {
        let chunk_timeout = Duration::from_secs(timeout_secs);
        let bytes = match tokio::time::timeout(chunk_timeout, body.next()).await {
            Ok(Some(Ok(bytes))) => bytes,
            Ok(Some(Err(e))) => {
                let _ = tx.send(Err(Error::GenerationStream(e.to_string()))).await;
                return;
            }
            Ok(None) => break,
            Err(_) => {
                let _ = tx.send(Err(Error::GenerationTimeout(timeout_secs))).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&bytes));
        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer.drain(..=pos);
            if line.is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(chunk) => {
                    if let Some(message) = chunk.error {
                        let _ = tx.send(Err(Error::GenerationStream(message))).await;
                        return;
                    }
                    if !chunk.response.is_empty()
                        && tx.send(Ok(chunk.response)).await.is_err()
                    {
                        debug!("Answer stream receiver dropped, cancelling");
                        return;
                    }
                    if chunk.done {
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
    }

    // Body ended without a done marker; flush any trailing partial line
    let line = buffer.trim();
    if !line.is_empty() {
        warn!("Generation stream ended mid-line");
        if let Ok(chunk) = parse_line(line) {
            if !chunk.response.is_empty() {
                let _ = tx.send(Ok(chunk.response)).await;
            }
        }
    }
}

fn parse_line(line: &str) -> Result<GenerateChunk> {
    serde_json::from_str(line)
        .map_err(|e| Error::GenerationStream(format!("invalid stream line: {}", e)))
}

/// Stream of answer fragments
///
/// Dropping the stream cancels the underlying generation request.
pub struct AnswerStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream").finish_non_exhaustive()
    }
}

impl futures::Stream for AnswerStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl AnswerStream {
    /// Drain the stream into a single string
    ///
    /// Fragments received before a failure are kept; the error, if any, is
    /// returned alongside them.
    pub async fn collect(mut self) -> (String, Option<Error>) {
        let mut text = String::new();
        while let Some(item) = self.next().await {
            match item {
                Ok(fragment) => text.push_str(&fragment),
                Err(e) => return (text, Some(e)),
            }
        }
        (text, None)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// In-memory conversation history for an interactive session
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Turn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_turn(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
