//! Fan-out/fan-in across servers.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::candidates::CandidateSet;
use crate::config::RemoteServerConfig;
use crate::ledger::{now_local, Ledger};
use crate::torrent_client::RemoteClientFactory;

use super::{Console, FailureStage, RunSummary, ServerOutcome, ServerReport, ServerWorker, SweepMode};

/// Runs one worker per server and merges their outcomes.
///
/// All workers start at once; there is no pool or queue, the server list is
/// expected to be small. Outcomes are merged as they complete, so merge order
/// is not server order.
pub struct Aggregator {
    factory: Arc<dyn RemoteClientFactory>,
    mode: SweepMode,
}

impl Aggregator {
    pub fn new(factory: Arc<dyn RemoteClientFactory>, mode: SweepMode) -> Self {
        Self { factory, mode }
    }

    /// Sweep every server and wait for all of them.
    ///
    /// Always returns a summary: failed servers contribute what they processed
    /// before failing, which is nothing for connect, auth and list failures.
    pub async fn run(
        &self,
        servers: &[RemoteServerConfig],
        candidates: Arc<CandidateSet>,
        ledger: &Mutex<Ledger>,
        console: &mut Console,
    ) -> RunSummary {
        info!(
            servers = servers.len(),
            candidates = candidates.len(),
            debug = self.mode.is_debug(),
            "Starting sweep"
        );

        let mut pending: FuturesUnordered<_> = servers
            .iter()
            .map(|server| {
                let name = server.name.clone();
                let worker = ServerWorker::new(
                    server.clone(),
                    Arc::clone(&self.factory),
                    Arc::clone(&candidates),
                    self.mode,
                );
                let handle = tokio::spawn(worker.run());
                async move { (name, handle.await) }
            })
            .collect();

        let mut summary = RunSummary::default();

        while let Some((name, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(server = %name, error = %e, "Worker task failed");
                    self.harvest_failure(name, e.to_string())
                }
            };
            self.merge(outcome, ledger, console, &mut summary).await;
        }

        info!(
            matched = summary.total_matched,
            size = summary.total_size,
            failed = summary.failed_servers.len(),
            "Sweep finished"
        );
        summary
    }

    fn harvest_failure(&self, server_name: String, reason: String) -> ServerOutcome {
        let mut report = ServerReport::new(server_name);
        report.push_error(&now_local(), self.mode, &reason);
        ServerOutcome::Failure {
            report,
            stage: FailureStage::Harvest,
            reason,
        }
    }

    /// Fold one outcome into the ledger and the totals.
    ///
    /// Console output, text log appends and record appends all happen while
    /// the ledger lock is held, so lines from different servers never
    /// interleave.
    async fn merge(
        &self,
        outcome: ServerOutcome,
        ledger: &Mutex<Ledger>,
        console: &mut Console,
        summary: &mut RunSummary,
    ) {
        let mut ledger = ledger.lock().await;

        let failed = !outcome.is_success();
        let mut report = outcome.into_report();

        summary.total_matched += report.matched_count;
        summary.total_size += report.matched_size;
        if failed {
            summary.failed_servers.push(report.server_name.clone());
        }

        let mut lines = std::mem::take(&mut report.log_lines);
        if !failed || report.matched_count > 0 {
            lines.push(report.summary_line(self.mode));
        }

        for line in &lines {
            console.line(line);
            if !self.mode.is_debug() {
                if let Err(e) = ledger.append_line(line) {
                    warn!(server = %report.server_name, error = %e, "Failed to append to text log");
                }
            }
        }

        if !self.mode.is_debug() {
            ledger.extend(report.records);
        }
    }
}
