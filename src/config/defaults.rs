//! Default values for configuration

/// Default Ollama base URL for local development
pub fn default_ollama_url() -> String {
    std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Default generation model
pub fn default_generation_model() -> String {
    "qwen2.5:7b".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

/// Default embedding dimension for nomic-embed-text
pub fn default_embedding_dimension() -> usize {
    768
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default number of chunks retrieved per question
pub fn default_retrieve_k() -> usize {
    5
}

/// Default similarity threshold (results with a larger distance are dropped)
pub fn default_similarity_threshold() -> f32 {
    0.7
}

/// Default sampling temperature
pub fn default_temperature() -> f32 {
    0.7
}

/// Default nucleus sampling probability
pub fn default_top_p() -> f32 {
    0.9
}

/// Default top-k sampling cutoff
pub fn default_top_k() -> u32 {
    40
}

/// Default repeat penalty
pub fn default_repeat_penalty() -> f32 {
    1.1
}

/// Default maximum tokens per answer
pub fn default_max_tokens() -> u32 {
    2000
}

/// Default model-call timeout in seconds
pub fn default_generation_timeout() -> u64 {
    120
}
