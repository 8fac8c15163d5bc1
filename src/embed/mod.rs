//! Embedding generation
//!
//! Provides an abstraction over embedding backends with:
//! - A trait for different embedding providers
//! - An Ollama HTTP implementation
//! - Batch processing for ingestion

mod ollama;

pub use ollama::*;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Helper to embed in batches
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(batch.to_vec()).await?;
        all_embeddings.extend(embeddings);
    }

    Ok(all_embeddings)
}

#[cfg(test)]
pub mod testing {
    //! Deterministic in-process embedder for tests

    use super::*;

    /// Embeds text as a normalized letter-frequency histogram, so lexically
    /// similar strings land close together under cosine distance
    pub struct HistogramEmbedder;

    #[async_trait]
    impl Embedder for HistogramEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| histogram(t)).collect())
        }

        fn dimension(&self) -> usize {
            26
        }

        fn model_name(&self) -> &str {
            "histogram-test"
        }
    }

    fn histogram(text: &str) -> Vec<f32> {
        let mut bins = vec![0.0f32; 26];
        for c in text.chars().flat_map(|c| c.to_lowercase()) {
            if c.is_ascii_lowercase() {
                bins[(c as usize) - ('a' as usize)] += 1.0;
            }
        }
        let norm = bins.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut bins {
                *v /= norm;
            }
        }
        bins
    }

    /// An embedder that always fails, for exercising error paths
    pub struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Err(crate::error::Error::Embedding(
                "embedding backend unavailable".to_string(),
            ))
        }

        fn dimension(&self) -> usize {
            26
        }

        fn model_name(&self) -> &str {
            "failing-test"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::HistogramEmbedder;
    use super::*;

    #[tokio::test]
    async fn test_batch_helper_preserves_order_and_length() {
        let embedder = HistogramEmbedder;
        let texts: Vec<String> = (0..10).map(|i| format!("text number {}", i)).collect();

        let embeddings = embed_in_batches(&embedder, texts.clone(), 3).await.unwrap();
        assert_eq!(embeddings.len(), 10);

        let direct = embedder.embed(texts).await.unwrap();
        assert_eq!(embeddings, direct);
    }
}
