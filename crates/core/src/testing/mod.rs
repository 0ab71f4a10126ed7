//! Testing utilities and mock implementations.
//!
//! This module provides a mock remote client and factory so full sweeps can
//! be exercised without a real qBittorrent instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use seedsweep_core::testing::{fixtures, MockClientFactory, MockRemoteClient};
//!
//! let client = Arc::new(MockRemoteClient::with_torrents(vec![
//!     fixtures::remote_torrent("Show.S01E01", "abc", 1024),
//! ]));
//! let factory = MockClientFactory::new();
//! factory.register("seedbox", Arc::clone(&client));
//!
//! // Run an Orchestrator with the factory, then inspect the client...
//! assert_eq!(client.deleted_hashes().await, vec!["abc"]);
//! ```

mod mock_remote_client;

pub use mock_remote_client::{MockClientFactory, MockRemoteClient};

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// In-memory console target that can be read back after a sweep.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buf
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .buf
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::{Config, PathsConfig, RemoteServerConfig};
    use crate::torrent_client::RemoteTorrent;

    /// A server config with throwaway credentials.
    pub fn server_config(name: &str) -> RemoteServerConfig {
        RemoteServerConfig {
            name: name.to_string(),
            url: format!("http://{}.invalid:8080", name.to_lowercase()),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 5,
        }
    }

    pub fn remote_torrent(name: &str, hash: &str, size_bytes: u64) -> RemoteTorrent {
        RemoteTorrent {
            hash: hash.to_string(),
            name: name.to_string(),
            size_bytes,
        }
    }

    /// A config for `servers` with candidates and logs under `root`.
    pub fn config_in(root: &Path, servers: &[&str]) -> Config {
        Config {
            remote_servers: servers.iter().map(|s| server_config(s)).collect(),
            paths: PathsConfig {
                candidates_file: root.join("torrents_to_delete.json"),
                log_dir: root.join("logs"),
            },
        }
    }
}
