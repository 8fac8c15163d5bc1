//! Error types
//!
//! One error enum for the whole crate, with conversions from the underlying
//! library errors. Pipeline stages get their own variants so callers can tell
//! an extraction failure from an index failure from a generation failure.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed for {}: {message}", file.display())]
    Extraction { file: PathBuf, message: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index write failed: {0}")]
    IndexWrite(String),

    #[error("Index query failed: {0}")]
    IndexQuery(String),

    #[error("Cannot reach generation backend: {0}")]
    GenerationConnect(String),

    #[error("Generation stream failed: {0}")]
    GenerationStream(String),

    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not initialized. Run 'docchat init' first")]
    NotInitialized,

    #[error("Already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an `Extraction` error for the given file
    pub fn extraction(file: &Path, message: impl Into<String>) -> Self {
        Error::Extraction {
            file: file.to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
