//! Local directory feed source for development and tests.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::transport::{FeedSource, file_name};

/// Reads `{root}/{file name}` for each remote path.
#[derive(Debug, Clone)]
pub struct FileFeedSource {
    root_dir: PathBuf,
}

impl FileFeedSource {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, remote_path: &str) -> PathBuf {
        self.root_dir.join(file_name(remote_path))
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>> {
        let path = self.path(remote_path);
        log::info!("Reading {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::transport("retrieve", format!("{}: {e}", path.display())))
    }
}
