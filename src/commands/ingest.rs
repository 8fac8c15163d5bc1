//! Ingest command implementation

use crate::chunk::{chunk_source, compute_content_hash};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{extract_text, DocumentFormat};
use crate::store::IndexStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Statistics from an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// File name the document is indexed under
    pub source_name: String,

    /// Detected document format
    pub format: String,

    /// Hash of the extracted text
    pub content_hash: String,

    /// Characters of extracted text
    pub text_chars: usize,

    /// Stale chunks of a longer previous ingest that were removed
    pub chunks_replaced: u64,

    /// Chunks written to the index
    pub chunks_indexed: usize,

    /// Where the document copy was stored, if any
    pub stored_copy: Option<PathBuf>,
}

/// Ingest a single document into the index
///
/// Re-ingesting a file with the same name replaces all of its previous
/// chunks: the new batch overwrites shared identity keys, then rows past the
/// new chunk count are dropped. A failed insert leaves the previous records
/// untouched. The file is also copied into the managed documents directory
/// so `remove` can clean it up later.
pub async fn cmd_ingest(config: &Config, store: &IndexStore, path: &Path) -> Result<IngestStats> {
    let source_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(format!("{} has no file name", path.display())))?
        .to_string();

    let format = DocumentFormat::from_path(path)?;
    let text = extract_text(path)?;
    let content_hash = compute_content_hash(text.as_bytes());
    let text_chars = text.chars().count();

    if text.is_empty() {
        warn!("No extractable text in {:?}, nothing indexed", path);
        return Ok(IngestStats {
            source_name,
            format: format.to_string(),
            content_hash,
            text_chars,
            chunks_replaced: 0,
            chunks_indexed: 0,
            stored_copy: None,
        });
    }

    let records = chunk_source(&text, &source_name, &config.chunk)?;
    let chunks_indexed = store.insert(&records).await?;
    let chunks_replaced = store.delete_stale(&source_name, records.len()).await?;

    std::fs::create_dir_all(&config.paths.documents_dir)?;
    let dest = config.paths.documents_dir.join(&source_name);
    let same_file = dest
        .canonicalize()
        .ok()
        .zip(path.canonicalize().ok())
        .map(|(a, b)| a == b)
        .unwrap_or(false);
    if !same_file {
        std::fs::copy(path, &dest)?;
    }

    info!(
        "Ingested {:?} as '{}': {} chunks ({} replaced)",
        path, source_name, chunks_indexed, chunks_replaced
    );

    Ok(IngestStats {
        source_name,
        format: format.to_string(),
        content_hash,
        text_chars,
        chunks_replaced,
        chunks_indexed,
        stored_copy: Some(dest),
    })
}
