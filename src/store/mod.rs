//! Embedded persistent chunk index
//!
//! Stores (content, embedding, metadata) records in a local SQLite database
//! and answers similarity queries with a brute-force scan over the stored
//! vectors. The database file survives restarts; reopening the same path
//! reattaches to the same collection.
//!
//! Write batches (inserts and per-source deletes) run inside a transaction,
//! so concurrent readers never observe a half-applied batch.

mod schema;

pub use schema::*;

use crate::chunk::ChunkRecord;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Batch size for embedding during ingestion
const EMBED_BATCH_SIZE: usize = 32;

/// Distance function used for similarity search (lower = more similar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::Euclidean => write!(f, "euclidean"),
            SimilarityMetric::Dot => write!(f, "dot"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" | "l2" => Ok(SimilarityMetric::Euclidean),
            "dot" | "ip" => Ok(SimilarityMetric::Dot),
            _ => Err(Error::InvalidConfig(format!(
                "Unknown similarity metric: {}",
                s
            ))),
        }
    }
}

impl SimilarityMetric {
    /// Distance between two vectors; always >= 0
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let d = match self {
            SimilarityMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (na * nb)
                }
            }
            SimilarityMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            SimilarityMetric::Dot => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                1.0 - dot
            }
        };
        d.max(0.0)
    }
}

/// A similarity search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The chunk text
    pub content: String,

    /// Identifier of the originating document
    pub source_id: String,

    /// Display name of the originating document
    pub source_name: String,

    /// Chunk index within the source (0-based)
    pub chunk_index: usize,

    /// Total chunks for the source at insertion time
    pub chunk_count: usize,

    /// Distance under the configured metric; lower = more similar
    pub distance: f32,
}

/// Stored chunk row
#[derive(Debug, Clone, FromRow)]
struct StoredChunk {
    #[allow(dead_code)]
    key: String,
    source_id: String,
    source_name: String,
    chunk_index: i64,
    chunk_count: i64,
    content: String,
    embedding: Vec<u8>,
}

/// Persistent chunk index handle
#[derive(Clone)]
pub struct IndexStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    metric: SimilarityMetric,
}

impl IndexStore {
    /// Open (or create) the index at the given path
    pub async fn open(
        db_path: &Path,
        embedder: Arc<dyn Embedder>,
        metric: SimilarityMetric,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Opening chunk index at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self {
            pool,
            embedder,
            metric,
        })
    }

    /// The configured distance metric
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Insert a batch of chunk records, overwriting records that share an
    /// identity key
    ///
    /// The batch is atomic: every record is embedded first, then all rows are
    /// written in a single transaction. On failure no row of the batch is
    /// applied. Returns the number of records written.
    pub async fn insert(&self, records: &[ChunkRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for record in records {
            record.validate()?;
        }

        let contents: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let embeddings = embed_in_batches(self.embedder.as_ref(), contents, EMBED_BATCH_SIZE)
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;

        if embeddings.len() != records.len() {
            return Err(Error::IndexWrite(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                records.len()
            )));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;

        for (record, embedding) in records.iter().zip(&embeddings) {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO chunks
                    (key, source_id, source_name, chunk_index, chunk_count, content, embedding, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.identity_key())
            .bind(&record.source_id)
            .bind(&record.source_name)
            .bind(record.chunk_index as i64)
            .bind(record.chunk_count as i64)
            .bind(&record.content)
            .bind(encode_embedding(embedding))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;

        info!("Indexed {} chunks", records.len());
        Ok(records.len())
    }

    /// Return up to `k` results ordered by ascending distance
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryResult>> {
        if k == 0 {
            return Err(Error::InvalidConfig("query k must be >= 1".to_string()));
        }

        let query_embedding = self
            .embedder
            .embed(vec![text.to_string()])
            .await
            .map_err(|e| Error::IndexQuery(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::IndexQuery("embedder returned no vector".to_string()))?;

        let rows: Vec<StoredChunk> = sqlx::query_as("SELECT * FROM chunks")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::IndexQuery(e.to_string()))?;

        let mut results: Vec<QueryResult> = rows
            .into_iter()
            .map(|row| {
                let embedding = decode_embedding(&row.embedding);
                QueryResult {
                    distance: self.metric.distance(&query_embedding, &embedding),
                    content: row.content,
                    source_id: row.source_id,
                    source_name: row.source_name,
                    chunk_index: row.chunk_index as usize,
                    chunk_count: row.chunk_count as usize,
                }
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);

        debug!("Query returned {} results", results.len());
        Ok(results)
    }

    /// Remove every record of the given source; returns the number removed
    pub async fn delete_by_source(&self, source_name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE source_name = ?")
            .bind(source_name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("Removed {} chunks for source '{}'", removed, source_name);
        }
        Ok(removed)
    }

    /// Remove a source's records at or beyond the given chunk index
    ///
    /// Used after re-ingesting a source that shrank: rows the new batch
    /// overwrote stay, rows past the new chunk count are stale.
    pub async fn delete_stale(&self, source_name: &str, keep_count: usize) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE source_name = ? AND chunk_index >= ?")
            .bind(source_name)
            .bind(keep_count as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!("Removed {} stale chunks for source '{}'", removed, source_name);
        }
        Ok(removed)
    }

    /// Distinct source names currently indexed (set semantics, unordered)
    pub async fn list_sources(&self) -> Result<Vec<String>> {
        let sources: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT source_name FROM chunks")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| Error::IndexQuery(e.to_string()))?;
        Ok(sources)
    }

    /// Number of indexed chunks
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::IndexQuery(e.to_string()))?;
        Ok(count as u64)
    }

    /// Clear the whole collection
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM chunks")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::IndexWrite(e.to_string()))?;
        info!("Index reset");
        Ok(())
    }
}

/// Encode an embedding as little-endian f32 bytes
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into an embedding
fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
