//! Ollama HTTP embedding backend

use super::Embedder;
use crate::config::{Config, EmbeddingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by an Ollama `/api/embeddings` endpoint
pub struct OllamaEmbedder {
    client: Client,
    base_url: Url,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Create an embedder from the main configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.ollama_url, &config.embedding)
    }

    pub fn new(base_url: &str, config: &EmbeddingConfig) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join("/api/embeddings")
            .map_err(|e| Error::InvalidConfig(format!("Invalid Ollama URL: {}", e)))
    }

    fn validate_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                self.model,
                self.dimension,
                embedding.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint()?;
        let mut embeddings = Vec::with_capacity(texts.len());

        // The embeddings endpoint takes one prompt per request
        for text in &texts {
            let request = EmbeddingRequest {
                model: &self.model,
                prompt: text,
            };

            let response = self
                .client
                .post(url.clone())
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Embedding(e.to_string()))?
                .error_for_status()
                .map_err(|e| Error::Embedding(e.to_string()))?;

            let parsed: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| Error::Embedding(e.to_string()))?;

            self.validate_dimension(&parsed.embedding)?;
            embeddings.push(parsed.embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            model: "nomic-embed-text".to_string(),
            dimension,
        }
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(
                serde_json::json!({"model": "nomic-embed-text"}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [0.1, 0.2, 0.3]})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), &test_config(3)).unwrap();
        let embeddings = embedder
            .embed(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [0.1, 0.2]})),
            )
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), &test_config(3)).unwrap();
        let err = embedder.embed(vec!["text".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), &test_config(3)).unwrap();
        let err = embedder.embed(vec!["text".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 into an error

        let embedder = OllamaEmbedder::new(&server.uri(), &test_config(3)).unwrap();
        let embeddings = embedder.embed(Vec::new()).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
