//! Mock remote client for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::RemoteServerConfig;
use crate::torrent_client::{
    RemoteClient, RemoteClientFactory, RemoteTorrent, TorrentClientError,
};

/// Scripted failures for a mock server.
#[derive(Debug, Default)]
struct Faults {
    auth: bool,
    list: bool,
    logout: bool,
    panic_on_list: bool,
    delete_hashes: HashSet<String>,
    list_delay: Option<Duration>,
}

/// Mock implementation of the RemoteClient trait.
///
/// Provides controllable behavior for testing:
/// - Serve a fixed torrent list, in insertion order
/// - Record delete and logout calls for assertions
/// - Simulate failures at every step
///
/// # Example
///
/// ```rust,ignore
/// let client = MockRemoteClient::with_torrents(vec![fixtures::remote_torrent("A", "h1", 10)]);
/// client.fail_delete_of("h1").await;
///
/// client.authenticate().await?;
/// assert!(client.delete_torrents(&["h1".to_string()], true).await.is_err());
/// assert_eq!(client.torrent_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockRemoteClient {
    torrents: RwLock<Vec<RemoteTorrent>>,
    deleted: RwLock<Vec<String>>,
    logouts: RwLock<u32>,
    faults: RwLock<Faults>,
}

impl MockRemoteClient {
    /// Create an empty mock server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock server listing the given torrents.
    pub fn with_torrents(torrents: Vec<RemoteTorrent>) -> Self {
        Self {
            torrents: RwLock::new(torrents),
            ..Self::default()
        }
    }

    /// Reject the next logins with bad credentials.
    pub async fn fail_authentication(&self) {
        self.faults.write().await.auth = true;
    }

    /// Fail the torrent listing.
    pub async fn fail_listing(&self) {
        self.faults.write().await.list = true;
    }

    /// Fail any delete call that includes `hash`.
    pub async fn fail_delete_of(&self, hash: &str) {
        self.faults.write().await.delete_hashes.insert(hash.to_string());
    }

    pub async fn fail_logout(&self) {
        self.faults.write().await.logout = true;
    }

    /// Panic inside `list_torrents`, to exercise task-level failures.
    pub async fn panic_on_list(&self) {
        self.faults.write().await.panic_on_list = true;
    }

    /// Delay the listing, to control completion order across servers.
    pub async fn set_list_delay(&self, delay: Duration) {
        self.faults.write().await.list_delay = Some(delay);
    }

    /// Hashes deleted so far, in call order.
    pub async fn deleted_hashes(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    pub async fn logout_calls(&self) -> u32 {
        *self.logouts.read().await
    }

    /// Torrents still present on the mock server.
    pub async fn torrent_count(&self) -> usize {
        self.torrents.read().await.len()
    }

    /// Add a torrent to the listing.
    pub async fn add_torrent(&self, torrent: RemoteTorrent) {
        self.torrents.write().await.push(torrent);
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn authenticate(&self) -> Result<(), TorrentClientError> {
        if self.faults.read().await.auth {
            return Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_torrents(&self) -> Result<Vec<RemoteTorrent>, TorrentClientError> {
        let (fail, panic, delay) = {
            let faults = self.faults.read().await;
            (faults.list, faults.panic_on_list, faults.list_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panic {
            panic!("mock server blew up while listing");
        }
        if fail {
            return Err(TorrentClientError::ApiError("HTTP 500".to_string()));
        }

        Ok(self.torrents.read().await.clone())
    }

    async fn delete_torrents(
        &self,
        hashes: &[String],
        _delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        {
            let faults = self.faults.read().await;
            if let Some(hash) = hashes.iter().find(|h| faults.delete_hashes.contains(*h)) {
                return Err(TorrentClientError::ApiError(format!(
                    "delete of {} rejected",
                    hash
                )));
            }
        }

        self.torrents
            .write()
            .await
            .retain(|t| !hashes.contains(&t.hash));
        self.deleted.write().await.extend(hashes.iter().cloned());
        Ok(())
    }

    async fn logout(&self) -> Result<(), TorrentClientError> {
        *self.logouts.write().await += 1;
        if self.faults.read().await.logout {
            return Err(TorrentClientError::ConnectionFailed(
                "connection reset".to_string(),
            ));
        }
        Ok(())
    }
}

/// Factory handing out registered mock clients by server name.
///
/// Servers without a registered client fail at construction, like an
/// unreachable host would.
#[derive(Debug, Default)]
pub struct MockClientFactory {
    clients: Mutex<HashMap<String, Arc<MockRemoteClient>>>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `client` for the server called `server_name`.
    pub fn register(&self, server_name: &str, client: Arc<MockRemoteClient>) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.insert(server_name.to_string(), client);
        }
    }
}

impl RemoteClientFactory for MockClientFactory {
    fn create(
        &self,
        server: &RemoteServerConfig,
    ) -> Result<Arc<dyn RemoteClient>, TorrentClientError> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| TorrentClientError::Internal(e.to_string()))?;

        clients
            .get(&server.name)
            .map(|client| Arc::clone(client) as Arc<dyn RemoteClient>)
            .ok_or_else(|| {
                TorrentClientError::ConnectionFailed(format!("no route to {}", server.url))
            })
    }
}
