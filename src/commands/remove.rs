//! Remove command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::IndexStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Statistics from removing a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveStats {
    pub source_name: String,
    pub chunks_removed: u64,
    pub file_removed: bool,
}

/// Remove a document's chunks from the index along with its stored copy
///
/// Removing an unknown source is a no-op that reports zero removals.
pub async fn cmd_remove(
    config: &Config,
    store: &IndexStore,
    source_name: &str,
) -> Result<RemoveStats> {
    // Source names are bare file names; reject anything that could escape
    // the documents directory
    if source_name.is_empty() || source_name.contains(['/', '\\']) {
        return Err(Error::InvalidPath(format!(
            "invalid source name: {:?}",
            source_name
        )));
    }

    let chunks_removed = store.delete_by_source(source_name).await?;

    let stored = config.paths.documents_dir.join(source_name);
    let file_removed = if stored.is_file() {
        std::fs::remove_file(&stored)?;
        true
    } else {
        false
    };

    info!(
        "Removed source '{}': {} chunks, stored copy removed: {}",
        source_name, chunks_removed, file_removed
    );

    Ok(RemoveStats {
        source_name: source_name.to_string(),
        chunks_removed,
        file_removed,
    })
}
