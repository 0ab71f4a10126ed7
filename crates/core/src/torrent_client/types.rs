//! Types for remote torrent client operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteServerConfig;

/// Errors that can occur during remote client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TorrentClientError {
    /// Whether this error came from the login step rather than a later call.
    pub fn is_auth(&self) -> bool {
        matches!(self, TorrentClientError::AuthenticationFailed(_))
    }
}

/// A torrent as listed by a remote server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTorrent {
    /// Info hash (lowercase hex), the identifier used for deletion.
    pub hash: String,
    /// Torrent name, the key candidates are matched against.
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
}

/// Trait for remote download-client backends.
///
/// A client is owned by exactly one worker for the duration of a sweep.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Open a session.
    async fn authenticate(&self) -> Result<(), TorrentClientError>;

    /// List every torrent, in the order the server returns them.
    async fn list_torrents(&self) -> Result<Vec<RemoteTorrent>, TorrentClientError>;

    /// Remove torrents by hash.
    /// If `delete_files` is true, also delete downloaded files.
    async fn delete_torrents(
        &self,
        hashes: &[String],
        delete_files: bool,
    ) -> Result<(), TorrentClientError>;

    /// Close the session.
    async fn logout(&self) -> Result<(), TorrentClientError>;
}

/// Builds one client per configured server.
///
/// Construction may fail (bad URL, TLS setup); that failure is isolated to the
/// server it was built for.
pub trait RemoteClientFactory: Send + Sync {
    fn create(
        &self,
        server: &RemoteServerConfig,
    ) -> Result<Arc<dyn RemoteClient>, TorrentClientError>;
}
