//! Anonymous FTP retrieval from `ftp.bom.gov.au`.
//!
//! Each fetch opens its own session (dial, login, retrieve, quit) on a
//! blocking thread, so no connection state is shared between states.

use std::net::ToSocketAddrs;
use std::time::Duration;

use async_trait::async_trait;
use suppaftp::FtpStream;

use crate::error::{AppError, Result};
use crate::models::FeedConfig;
use crate::transport::FeedSource;

/// FTP-backed feed source.
#[derive(Debug, Clone)]
pub struct FtpFeedSource {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout: Duration,
}

impl FtpFeedSource {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            timeout,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            &config.host,
            config.port,
            &config.username,
            &config.password,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn retrieve(&self, remote_path: &str) -> Result<Vec<u8>> {
        let address = format!("{}:{}", self.host, self.port);
        let socket = address
            .to_socket_addrs()
            .map_err(|e| AppError::transport("dial", format!("{address}: {e}")))?
            .next()
            .ok_or_else(|| AppError::transport("dial", format!("{address}: no address")))?;

        let mut ftp = FtpStream::connect_timeout(socket, self.timeout)
            .map_err(|e| AppError::transport("dial", format!("{address}: {e}")))?;

        // Bounds every later reply, so an abandoned fetch cannot pin this thread.
        ftp.get_ref()
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| AppError::transport("dial", format!("{address}: {e}")))?;

        ftp.login(self.username.as_str(), self.password.as_str())
            .map_err(|e| AppError::transport("login", e))?;

        let buffer = ftp
            .retr_as_buffer(remote_path)
            .map_err(|e| AppError::transport("retrieve", format!("{remote_path}: {e}")))?;

        if let Err(e) = ftp.quit() {
            log::debug!("FTP quit after {} failed: {}", remote_path, e);
        }

        Ok(buffer.into_inner())
    }
}

#[async_trait]
impl FeedSource for FtpFeedSource {
    async fn fetch(&self, remote_path: &str) -> Result<Vec<u8>> {
        let source = self.clone();
        let path = remote_path.to_string();

        log::info!("Retrieving ftp://{}{}", self.host, remote_path);
        tokio::task::spawn_blocking(move || source.retrieve(&path))
            .await
            .map_err(|e| AppError::transport("retrieve", format!("FTP task failed: {e}")))?
    }
}
