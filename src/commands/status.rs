//! Status and sources command implementations

use crate::config::Config;
use crate::error::Result;
use crate::generate::GenerationClient;
use crate::store::IndexStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub documents_dir: String,
    pub ollama_url: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub similarity_metric: String,
    pub backend_reachable: bool,
    pub indexed_chunks: u64,
    pub source_count: usize,
}

/// Get system status
pub async fn cmd_status(
    config: &Config,
    store: &IndexStore,
    client: &GenerationClient,
) -> Result<StatusInfo> {
    info!("Getting status");

    let indexed_chunks = store.count().await?;
    let source_count = store.list_sources().await?.len();
    let backend_reachable = client.is_reachable().await;

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        documents_dir: config.paths.documents_dir.display().to_string(),
        ollama_url: config.ollama_url.clone(),
        generation_model: config.generation.model.clone(),
        embedding_model: config.embedding.model.clone(),
        similarity_metric: store.metric().to_string(),
        backend_reachable,
        indexed_chunks,
        source_count,
    })
}

/// List indexed source names, sorted
pub async fn cmd_list_sources(store: &IndexStore) -> Result<Vec<String>> {
    info!("Listing sources");

    let mut sources = store.list_sources().await?;
    sources.sort();
    Ok(sources)
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\ndocchat Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Index: {}", status.db_path);
    println!("Documents: {}", status.documents_dir);
    println!("\nOllama:");
    println!("  URL: {}", status.ollama_url);
    println!("  Generation model: {}", status.generation_model);
    println!("  Embedding model: {}", status.embedding_model);
    let backend = if status.backend_reachable {
        "connected"
    } else {
        "not reachable"
    };
    println!("  Status: {}", backend);
    println!("\nIndex:");
    println!("  Metric: {}", status.similarity_metric);
    println!("  Sources: {}", status.source_count);
    println!("  Chunks: {}", status.indexed_chunks);
}

/// Print sources list to console
pub fn print_sources(sources: &[String]) {
    if sources.is_empty() {
        println!("No documents indexed. Use 'docchat ingest' to add one.");
        return;
    }
    for source in sources {
        println!("{}", source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkRecord;
    use crate::embed::testing::HistogramEmbedder;
    use crate::store::SimilarityMetric;
    use std::sync::Arc;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(source_name: &str, content: &str) -> ChunkRecord {
        ChunkRecord {
            content: content.to_string(),
            source_id: "src".to_string(),
            source_name: source_name.to_string(),
            chunk_index: 0,
            chunk_count: 1,
        }
    }

    #[tokio::test]
    async fn test_status_reports_counts_and_backend() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(dir.path().to_path_buf()));

        let store = IndexStore::open(
            &config.paths.db_file,
            Arc::new(HistogramEmbedder),
            SimilarityMetric::Cosine,
        )
        .await
        .unwrap();
        store
            .insert(&[record("a.txt", "alpha"), record("b.txt", "beta")])
            .await
            .unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"models\":[]}"))
            .mount(&server)
            .await;

        let client = GenerationClient::new(&server.uri()).unwrap();
        let status = cmd_status(&config, &store, &client).await.unwrap();

        assert_eq!(status.indexed_chunks, 2);
        assert_eq!(status.source_count, 2);
        assert!(status.backend_reachable);
        assert_eq!(status.similarity_metric, "cosine");

        let sources = cmd_list_sources(&store).await.unwrap();
        assert_eq!(sources, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }
}
