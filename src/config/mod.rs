//! Configuration management for docchat
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::store::SimilarityMetric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama base URL (embedding and generation backend)
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap characters between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Index configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    /// Distance function used for similarity search
    #[serde(default)]
    pub similarity_metric: SimilarityMetric,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_retrieve_k")]
    pub retrieve_k: usize,

    /// Results whose distance exceeds this are dropped before prompting
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

/// Generation configuration (model call options)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model name/identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature (>= 0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling probability (0 - 1)
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling cutoff (>= 1)
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Repeat penalty (>= 1)
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f32,

    /// Maximum tokens per answer (>= 1)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Model-call timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for docchat data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the SQLite chunk index
    pub db_file: PathBuf,

    /// Directory holding the original uploaded files
    pub documents_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            embedding: EmbeddingConfig::default(),
            chunk: ChunkConfig::default(),
            index: IndexConfig::default(),
            query: QueryConfig::default(),
            generation: GenerationConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retrieve_k: default_retrieve_k(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            repeat_penalty: default_repeat_penalty(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Config {
    /// Get the default base directory for docchat (~/.docchat)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docchat")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("index.db"),
            documents_dir: base.join("documents"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::NotInitialized);
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("index.db"),
            documents_dir: base.join("documents"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "chunk.chunk_size must be >= 1".to_string(),
            ));
        }

        if self.chunk.chunk_overlap >= self.chunk.chunk_size {
            return Err(Error::InvalidConfig(
                "chunk.chunk_overlap must be < chunk.chunk_size".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig(
                "embedding.dimension must be >= 1".to_string(),
            ));
        }

        if self.query.retrieve_k == 0 {
            return Err(Error::InvalidConfig(
                "query.retrieve_k must be >= 1".to_string(),
            ));
        }

        if self.query.similarity_threshold < 0.0 {
            return Err(Error::InvalidConfig(
                "query.similarity_threshold must be >= 0".to_string(),
            ));
        }

        if self.generation.temperature < 0.0 {
            return Err(Error::InvalidConfig(
                "generation.temperature must be >= 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(Error::InvalidConfig(
                "generation.top_p must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.generation.top_k == 0 {
            return Err(Error::InvalidConfig(
                "generation.top_k must be >= 1".to_string(),
            ));
        }

        if self.generation.repeat_penalty < 1.0 {
            return Err(Error::InvalidConfig(
                "generation.repeat_penalty must be >= 1.0".to_string(),
            ));
        }

        if self.generation.max_tokens == 0 {
            return Err(Error::InvalidConfig(
                "generation.max_tokens must be >= 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk.chunk_size, 1000);
        assert_eq!(config.chunk.chunk_overlap, 200);
        assert_eq!(config.query.retrieve_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.generation.model = "llama2:7b".to_string();
        config.chunk.chunk_size = 500;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.generation.model, "llama2:7b");
        assert_eq!(loaded.chunk.chunk_size, 500);
        assert_eq!(loaded.paths.db_file, tmp.path().join("index.db"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Invalid: overlap >= size
        config.chunk.chunk_overlap = config.chunk.chunk_size;
        assert!(config.validate().is_err());
        config.chunk.chunk_overlap = 100;
        assert!(config.validate().is_ok());

        // Invalid: top_p out of range
        config.generation.top_p = 1.5;
        assert!(config.validate().is_err());
        config.generation.top_p = 0.9;

        // Invalid: repeat penalty below 1
        config.generation.repeat_penalty = 0.5;
        assert!(config.validate().is_err());
        config.generation.repeat_penalty = 1.1;

        // Invalid: k = 0
        config.query.retrieve_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_config_is_not_initialized() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
    }
}
