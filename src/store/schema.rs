//! SQLite schema for the chunk index

/// SQL schema for the embedded chunk index
pub const SCHEMA_SQL: &str = r#"
-- Chunks: one row per indexed chunk, keyed by "{source_name}_{chunk_index}"
CREATE TABLE IF NOT EXISTS chunks (
    key TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    source_name TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    chunk_count INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

-- Deletion and listing work per source
CREATE INDEX IF NOT EXISTS idx_chunks_source_name ON chunks(source_name);
"#;
