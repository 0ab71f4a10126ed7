use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub remote_servers: Vec<RemoteServerConfig>,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// One remote qBittorrent WebUI to sweep.
#[derive(Clone, Deserialize, Serialize)]
pub struct RemoteServerConfig {
    /// Display name, unique across the run.
    pub name: String,
    /// WebUI base URL (e.g., "http://seedbox:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

// Keeps the password out of logs.
impl fmt::Debug for RemoteServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteServerConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout() -> u32 {
    30
}

/// Where the sweep reads candidates and keeps its ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_candidates_file")]
    pub candidates_file: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            candidates_file: default_candidates_file(),
            log_dir: default_log_dir(),
        }
    }
}

impl PathsConfig {
    /// Human-readable append log.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("delete_log.txt")
    }

    /// Structured record store.
    pub fn records_file(&self) -> PathBuf {
        self.log_dir.join("delete_records.json")
    }
}

fn default_candidates_file() -> PathBuf {
    PathBuf::from("torrents_to_delete.json")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
