//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Base directory; defaults to ~/.docchat
    pub base_dir: Option<PathBuf>,

    /// Overwrite an existing configuration
    pub force: bool,
}

/// Initialize the docchat directory layout and default configuration
pub async fn cmd_init(options: InitOptions) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(options.base_dir);

    if config.paths.config_file.exists() && !options.force {
        return Err(Error::AlreadyInitialized(config.paths.base_dir.clone()));
    }

    std::fs::create_dir_all(&config.paths.documents_dir)?;
    config.save()?;

    info!("Initialized docchat at {:?}", config.paths.base_dir);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_layout() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("docchat");

        let config = cmd_init(InitOptions {
            base_dir: Some(base.clone()),
            force: false,
        })
        .await
        .unwrap();

        assert!(config.paths.config_file.is_file());
        assert!(config.paths.documents_dir.is_dir());
        assert_eq!(config.paths.base_dir, base);

        // Reload roundtrip
        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.chunk.chunk_size, config.chunk.chunk_size);
    }

    #[tokio::test]
    async fn test_init_refuses_existing_without_force() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("docchat");
        let options = InitOptions {
            base_dir: Some(base),
            force: false,
        };

        cmd_init(options.clone()).await.unwrap();
        let err = cmd_init(options.clone()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized(_)));

        cmd_init(InitOptions {
            force: true,
            ..options
        })
        .await
        .unwrap();
    }
}
