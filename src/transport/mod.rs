//! Feed retrieval.
//!
//! The ingestion pipeline only needs "remote path in, bytes out". The
//! adapters here cover the Bureau's anonymous FTP server, its public HTTP
//! mirror, and a local directory for development.

pub mod file;
pub mod ftp;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FeedConfig, FeedTransport};

pub use file::FileFeedSource;
pub use ftp::FtpFeedSource;
pub use http::HttpFeedSource;

/// Retrieves raw product files.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the file at `remote_path`, e.g. `/anon/gen/fwo/IDN11060.xml`.
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>>;
}

/// Build the configured feed source.
pub fn from_config(config: &FeedConfig) -> Result<Arc<dyn FeedSource>> {
    let source: Arc<dyn FeedSource> = match config.transport {
        FeedTransport::Ftp => Arc::new(FtpFeedSource::from_config(config)),
        FeedTransport::Http => Arc::new(HttpFeedSource::from_config(config)?),
        FeedTransport::File => Arc::new(FileFeedSource::new(&config.local_dir)),
    };
    Ok(source)
}

/// Last path segment of a remote product path.
pub fn file_name(remote_path: &str) -> &str {
    remote_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(remote_path)
}
