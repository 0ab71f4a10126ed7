pub mod candidates;
pub mod config;
pub mod format;
pub mod ledger;
pub mod sweep;
pub mod testing;
pub mod torrent_client;

pub use candidates::{load_candidates, Candidate, CandidateLoadError, CandidateSet};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PathsConfig,
    RemoteServerConfig,
};
pub use format::format_size;
pub use ledger::{DeletionAction, DeletionRecord, Ledger, LedgerError, LedgerState};
pub use sweep::{
    Aggregator, Console, FailureStage, Orchestrator, RunSummary, ServerOutcome, ServerReport,
    ServerWorker, SweepError, SweepMode,
};
pub use torrent_client::{
    QBittorrentClient, QBittorrentFactory, RemoteClient, RemoteClientFactory, RemoteTorrent,
    TorrentClientError,
};
