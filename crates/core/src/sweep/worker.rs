//! Per-server sweep.

use std::slice;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::candidates::CandidateSet;
use crate::config::RemoteServerConfig;
use crate::ledger::{now_local, DeletionRecord};
use crate::torrent_client::{RemoteClient, RemoteClientFactory, TorrentClientError};

use super::{FailureStage, ServerOutcome, ServerReport, SweepMode};

/// Matches one server's torrents against the candidate set.
///
/// Owns its remote session and writes nothing outside its own
/// `ServerOutcome`.
pub struct ServerWorker {
    server: RemoteServerConfig,
    factory: Arc<dyn RemoteClientFactory>,
    candidates: Arc<CandidateSet>,
    mode: SweepMode,
}

/// A failed call together with the step it failed in.
struct StageError {
    stage: FailureStage,
    source: TorrentClientError,
}

impl StageError {
    fn at(stage: FailureStage) -> impl FnOnce(TorrentClientError) -> Self {
        move |source| Self { stage, source }
    }
}

impl ServerWorker {
    pub fn new(
        server: RemoteServerConfig,
        factory: Arc<dyn RemoteClientFactory>,
        candidates: Arc<CandidateSet>,
        mode: SweepMode,
    ) -> Self {
        Self {
            server,
            factory,
            candidates,
            mode,
        }
    }

    /// Run the sweep for this server.
    ///
    /// Never returns an error: every failure becomes a `ServerOutcome::Failure`
    /// carrying whatever was processed before it. Logout is attempted whenever
    /// a client was built, whatever happened in between.
    pub async fn run(self) -> ServerOutcome {
        let mut report = ServerReport::new(self.server.name.clone());

        info!(
            server = %self.server.name,
            url = %self.server.url,
            debug = self.mode.is_debug(),
            "Connecting to server"
        );

        let client = match self.factory.create(&self.server) {
            Ok(client) => client,
            Err(e) => {
                return self.fail(
                    report,
                    StageError {
                        stage: FailureStage::Connect,
                        source: e,
                    },
                )
            }
        };

        let result = self.sweep(client.as_ref(), &mut report).await;

        if let Err(e) = client.logout().await {
            debug!(server = %self.server.name, error = %e, "Logout failed, ignoring");
        }

        match result {
            Ok(()) => ServerOutcome::Success(report),
            Err(e) => self.fail(report, e),
        }
    }

    async fn sweep(
        &self,
        client: &dyn RemoteClient,
        report: &mut ServerReport,
    ) -> Result<(), StageError> {
        client
            .authenticate()
            .await
            .map_err(StageError::at(FailureStage::Authenticate))?;
        info!(server = %self.server.name, backend = client.name(), "Connected");

        let torrents = client
            .list_torrents()
            .await
            .map_err(StageError::at(FailureStage::List))?;
        debug!(
            server = %self.server.name,
            torrents = torrents.len(),
            "Checking torrents against candidates"
        );

        for torrent in torrents {
            if !self.candidates.contains(&torrent.name) {
                continue;
            }

            // A failed delete stops this server; earlier matches stay recorded.
            if !self.mode.is_debug() {
                client
                    .delete_torrents(slice::from_ref(&torrent.hash), true)
                    .await
                    .map_err(StageError::at(FailureStage::Delete))?;
            }

            let record = DeletionRecord {
                timestamp: now_local(),
                server_name: self.server.name.clone(),
                torrent_name: torrent.name,
                torrent_hash: torrent.hash,
                torrent_size: torrent.size_bytes,
                action: self.mode.action(),
                debug_mode: self.mode.is_debug(),
            };
            report.push_match(record, self.mode);
        }

        Ok(())
    }

    fn fail(&self, mut report: ServerReport, error: StageError) -> ServerOutcome {
        warn!(
            server = %self.server.name,
            stage = %error.stage,
            error = %error.source,
            processed = report.matched_count,
            "Server sweep stopped"
        );

        let reason = error.source.to_string();
        report.push_error(&now_local(), self.mode, &reason);

        ServerOutcome::Failure {
            report,
            stage: error.stage,
            reason,
        }
    }
}
