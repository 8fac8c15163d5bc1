//! Ask command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::{build_prompt, AnswerStream, ChatSession, GenerationClient, Role};
use crate::store::{IndexStore, QueryResult};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Override for the number of chunks to retrieve
    pub k: Option<usize>,

    /// When false, skip retrieval and answer from the model alone
    pub use_knowledge_base: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            k: None,
            use_knowledge_base: true,
        }
    }
}

/// A started answer, with the context that grounds it
pub struct AskOutcome {
    /// Streaming answer fragments
    pub stream: AnswerStream,

    /// Retrieved chunks that were folded into the prompt
    pub context: Vec<QueryResult>,
}

impl std::fmt::Debug for AskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskOutcome")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Answer a question against the knowledge base
///
/// Retrieves the closest chunks, drops the ones beyond the similarity
/// threshold, and starts a streamed completion grounded in the rest. With an
/// empty index (or retrieval disabled) the model answers ungrounded.
///
/// The question is recorded on the session here; the caller records the
/// assistant turn once the stream has been drained.
pub async fn cmd_ask(
    config: &Config,
    store: &IndexStore,
    client: &GenerationClient,
    session: &mut ChatSession,
    question: &str,
    options: AskOptions,
) -> Result<AskOutcome> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidConfig("question is empty".to_string()));
    }

    let context = if options.use_knowledge_base {
        let k = options.k.unwrap_or(config.query.retrieve_k);
        let hits = store.query(question, k).await?;
        let total = hits.len();
        let kept: Vec<QueryResult> = hits
            .into_iter()
            .filter(|hit| hit.distance <= config.query.similarity_threshold)
            .collect();
        debug!(
            "Retrieved {} chunks, {} within threshold {}",
            total,
            kept.len(),
            config.query.similarity_threshold
        );
        kept
    } else {
        Vec::new()
    };

    let prompt = build_prompt(question, &context);
    let stream = client.complete_stream(&prompt, &config.generation).await?;
    session.record_turn(Role::User, question);

    info!(
        "Asking '{}' with {} context chunks",
        question,
        context.len()
    );

    Ok(AskOutcome { stream, context })
}
