//! qBittorrent WebUI (API v2) client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::config::RemoteServerConfig;

use super::{RemoteClient, RemoteClientFactory, RemoteTorrent, TorrentClientError};

/// qBittorrent client implementation.
///
/// The session cookie lives in the HTTP client's cookie store, so a client
/// instance is one session. Expired sessions are not refreshed: a sweep is a
/// single pass and a rejected request is reported, not retried.
pub struct QBittorrentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client for one configured server.
    pub fn new(server: &RemoteServerConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| {
                TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: server.url.trim_end_matches('/').to_string(),
            username: server.username.clone(),
            password: server.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a POST request with form data, returning the body on success.
    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .form(params)
            .send()
            .await
            .map_err(map_send_error)?;

        read_success_body(response).await
    }
}

/// Map a reqwest send failure onto the client error taxonomy.
fn map_send_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

async fn read_success_body(response: Response) -> Result<String, TorrentClientError> {
    let status = response.status();
    if status.as_u16() == 403 {
        return Err(TorrentClientError::ApiError(
            "HTTP 403 (session rejected)".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| TorrentClientError::ApiError(e.to_string()))
}

/// qBittorrent torrent info response (only the fields a sweep reads).
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    size: i64,
}

impl QBTorrentInfo {
    fn into_remote_torrent(self) -> RemoteTorrent {
        RemoteTorrent {
            hash: self.hash.to_lowercase(),
            name: self.name,
            size_bytes: self.size.max(0) as u64,
        }
    }
}

#[async_trait]
impl RemoteClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn authenticate(&self) -> Result<(), TorrentClientError> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() && body.contains("Ok.") {
            debug!(url = %self.base_url, "qBittorrent login successful");
            Ok(())
        } else if body.contains("Fails.") {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else if status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Client IP is banned after too many failed logins".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {} {}",
                status.as_u16(),
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn list_torrents(&self) -> Result<Vec<RemoteTorrent>, TorrentClientError> {
        let response = self
            .client
            .get(self.endpoint("/api/v2/torrents/info"))
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_success_body(response).await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents
            .into_iter()
            .map(QBTorrentInfo::into_remote_torrent)
            .collect())
    }

    async fn delete_torrents(
        &self,
        hashes: &[String],
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        if hashes.is_empty() {
            return Ok(());
        }

        let joined = hashes
            .iter()
            .map(|h| h.to_lowercase())
            .collect::<Vec<_>>()
            .join("|");
        let delete_str = if delete_files { "true" } else { "false" };

        self.post_form(
            "/api/v2/torrents/delete",
            &[("hashes", &joined), ("deleteFiles", delete_str)],
        )
        .await?;

        Ok(())
    }

    async fn logout(&self) -> Result<(), TorrentClientError> {
        self.post_form("/api/v2/auth/logout", &[]).await?;
        Ok(())
    }
}

/// Creates a fresh `QBittorrentClient` (and so a fresh session) per server.
#[derive(Debug, Default, Clone, Copy)]
pub struct QBittorrentFactory;

impl RemoteClientFactory for QBittorrentFactory {
    fn create(
        &self,
        server: &RemoteServerConfig,
    ) -> Result<Arc<dyn RemoteClient>, TorrentClientError> {
        Ok(Arc::new(QBittorrentClient::new(server)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn server_config(url: &str) -> RemoteServerConfig {
        RemoteServerConfig {
            name: "box".to_string(),
            url: url.to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let qb_info = QBTorrentInfo {
            hash: "ABC123".to_string(),
            name: "Test Torrent".to_string(),
            size: 1000000,
        };

        let torrent = qb_info.into_remote_torrent();
        assert_eq!(torrent.hash, "abc123"); // lowercase
        assert_eq!(torrent.name, "Test Torrent");
        assert_eq!(torrent.size_bytes, 1000000);
    }

    #[test]
    fn test_negative_size_clamped() {
        let qb_info = QBTorrentInfo {
            hash: "a".to_string(),
            name: "Magnet without metadata".to_string(),
            size: -1,
        };
        assert_eq!(qb_info.into_remote_torrent().size_bytes, 0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = QBittorrentClient::new(&server_config("http://seedbox:8080/")).unwrap();
        assert_eq!(
            client.endpoint("/api/v2/auth/login"),
            "http://seedbox:8080/api/v2/auth/login"
        );
    }

    #[tokio::test]
    async fn test_authenticate_ok() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200)
                .header("set-cookie", "SID=abc; path=/")
                .body("Ok.");
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        client.authenticate().await.unwrap();
        login.assert();
    }

    #[tokio::test]
    async fn test_authenticate_bad_credentials() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Fails.");
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_authenticate_unreachable_host() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = QBittorrentClient::new(&server_config("http://127.0.0.1:9")).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(
            err,
            TorrentClientError::ConnectionFailed(_)
                | TorrentClientError::ApiError(_)
                | TorrentClientError::Timeout
        ));
    }

    #[tokio::test]
    async fn test_list_torrents_preserves_order() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"hash": "BBB", "name": "Second.Show", "size": 2048, "state": "uploading"},
                    {"hash": "aaa", "name": "First.Show", "size": 1024, "state": "pausedUP"}
                ]));
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        let torrents = client.list_torrents().await.unwrap();
        assert_eq!(torrents.len(), 2);
        assert_eq!(torrents[0].name, "Second.Show");
        assert_eq!(torrents[0].hash, "bbb");
        assert_eq!(torrents[1].size_bytes, 1024);
    }

    #[tokio::test]
    async fn test_list_torrents_http_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(500);
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        let err = client.list_torrents().await.unwrap_err();
        assert!(matches!(err, TorrentClientError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_list_torrents_malformed_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).body("<html>login</html>");
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        let err = client.list_torrents().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }

    #[tokio::test]
    async fn test_delete_torrents_posts_form() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/delete")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200);
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        client
            .delete_torrents(&["ABC".to_string()], true)
            .await
            .unwrap();
        delete.assert();
    }

    #[tokio::test]
    async fn test_delete_torrents_empty_is_noop() {
        // No server behind this URL: an empty delete must not send anything.
        let client = QBittorrentClient::new(&server_config("http://127.0.0.1:9")).unwrap();
        client.delete_torrents(&[], true).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_torrents_forbidden() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/delete");
            then.status(403);
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        let err = client
            .delete_torrents(&["abc".to_string()], true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_logout() {
        let server = MockServer::start_async().await;
        let logout = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/logout");
            then.status(200);
        });

        let client = QBittorrentClient::new(&server_config(&server.base_url())).unwrap();
        client.logout().await.unwrap();
        logout.assert();
    }

    #[test]
    fn test_factory_builds_client() {
        let factory = QBittorrentFactory;
        let client = factory.create(&server_config("http://seedbox:8080")).unwrap();
        assert_eq!(client.name(), "qbittorrent");
    }
}
