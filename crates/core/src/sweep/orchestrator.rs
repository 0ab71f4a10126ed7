//! Top-level sequencing of a sweep.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::candidates::{load_candidates, CandidateLoadError};
use crate::config::{validate_config, Config, ConfigError};
use crate::format::format_size;
use crate::ledger::{Ledger, LedgerError};
use crate::torrent_client::RemoteClientFactory;

use super::{Aggregator, Console, RunSummary, SweepMode};

/// Errors that abort a sweep as a whole.
///
/// All of them except a failed final persist happen before any server is
/// contacted.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Candidates(#[from] CandidateLoadError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Loads everything a sweep needs, runs it and persists the result.
pub struct Orchestrator {
    config: Config,
    factory: Arc<dyn RemoteClientFactory>,
    console: Console,
}

impl Orchestrator {
    pub fn new(config: Config, factory: Arc<dyn RemoteClientFactory>) -> Self {
        Self {
            config,
            factory,
            console: Console::stdout(),
        }
    }

    /// Send the report somewhere other than stdout.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Run one sweep.
    ///
    /// Configuration, ledger directory and candidate file are all checked
    /// before the first connection. The record store is rewritten only by a
    /// live sweep that matched something.
    pub async fn run(mut self, mode: SweepMode) -> Result<RunSummary, SweepError> {
        validate_config(&self.config)?;

        let paths = &self.config.paths;
        let ledger = Ledger::open(paths.log_file(), paths.records_file())?;
        info!(
            existing_records = ledger.records().len(),
            "Ledger ready at {:?}",
            paths.log_dir
        );

        let candidates = Arc::new(load_candidates(&paths.candidates_file)?);
        info!(
            candidates = candidates.len(),
            size = %format_size(candidates.total_size()),
            "Candidate list loaded"
        );

        let ledger = Mutex::new(ledger);
        let aggregator = Aggregator::new(Arc::clone(&self.factory), mode);
        let summary = aggregator
            .run(
                &self.config.remote_servers,
                candidates,
                &ledger,
                &mut self.console,
            )
            .await;

        self.print_summary(mode, &summary);

        let ledger = ledger.into_inner();
        if !mode.is_debug() && summary.total_matched > 0 {
            let state = ledger.persist()?;
            info!(total_records = state.total_records, "Record store updated");
            self.console
                .line(&format!("Log updated: {}", ledger.log_file().display()));
            self.console.line(&format!(
                "Records updated: {}",
                ledger.records_file().display()
            ));
        } else if mode.is_debug() {
            self.console
                .line("\n[DEBUG] Check complete, nothing was deleted");
        }

        Ok(summary)
    }

    fn print_summary(&mut self, mode: SweepMode, summary: &RunSummary) {
        let verb = match mode {
            SweepMode::Live => "Deleted",
            SweepMode::Debug => "Found",
        };

        self.console.line("\n=== Summary ===");
        self.console.line(&format!(
            "{}{} {} torrent(s) across all servers",
            mode.prefix(),
            verb,
            summary.total_matched
        ));
        self.console
            .line(&format!("Total size: {}", format_size(summary.total_size)));
        if !summary.failed_servers.is_empty() {
            self.console.line(&format!(
                "Servers with errors: {}",
                summary.failed_servers.join(", ")
            ));
        }
    }
}
