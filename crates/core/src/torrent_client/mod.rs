//! Remote torrent client abstraction.
//!
//! This module provides a `RemoteClient` trait for the handful of calls a
//! sweep needs against a download client (authenticate, list, delete,
//! logout), plus the qBittorrent WebUI implementation.

mod qbittorrent;
mod types;

pub use qbittorrent::{QBittorrentClient, QBittorrentFactory};
pub use types::*;
