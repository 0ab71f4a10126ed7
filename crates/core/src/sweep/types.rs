//! Types shared by the sweep workers and the aggregator.

use std::fmt;

use chrono::NaiveDateTime;

use crate::format::format_size;
use crate::ledger::{format_timestamp, DeletionAction, DeletionRecord};

/// Whether matches are deleted or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Find and delete.
    Live,
    /// Find and report only; no remote or ledger side effects.
    Debug,
}

impl SweepMode {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            SweepMode::Debug
        } else {
            SweepMode::Live
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, SweepMode::Debug)
    }

    /// Action recorded for a match in this mode.
    pub fn action(&self) -> DeletionAction {
        match self {
            SweepMode::Live => DeletionAction::Deleted,
            SweepMode::Debug => DeletionAction::Found,
        }
    }

    /// Prefix put in front of every report line.
    pub fn prefix(&self) -> &'static str {
        match self {
            SweepMode::Live => "",
            SweepMode::Debug => "[DEBUG] ",
        }
    }
}

/// Where in the per-server sequence a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Building the client for the server.
    Connect,
    Authenticate,
    List,
    /// A delete call; matches after this one were not processed.
    Delete,
    /// The worker task itself died (panic or cancellation).
    Harvest,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Connect => "connect",
            FailureStage::Authenticate => "authenticate",
            FailureStage::List => "list",
            FailureStage::Delete => "delete",
            FailureStage::Harvest => "harvest",
        };
        f.write_str(s)
    }
}

/// Everything one server contributed to the sweep.
#[derive(Debug, Clone)]
pub struct ServerReport {
    pub server_name: String,
    pub records: Vec<DeletionRecord>,
    pub matched_count: usize,
    pub matched_size: u64,
    /// Report lines in the order they happened, destined for console and text log.
    pub log_lines: Vec<String>,
}

impl ServerReport {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            records: Vec::new(),
            matched_count: 0,
            matched_size: 0,
            log_lines: Vec::new(),
        }
    }

    /// Account for one processed match.
    pub fn push_match(&mut self, record: DeletionRecord, mode: SweepMode) {
        self.log_lines.push(match_line(&record, mode));
        self.matched_count += 1;
        self.matched_size += record.torrent_size;
        self.records.push(record);
    }

    pub fn push_error(&mut self, at: &NaiveDateTime, mode: SweepMode, message: &str) {
        self.log_lines.push(format!(
            "[{}] {}error while processing server {}: {}",
            format_timestamp(at),
            mode.prefix(),
            self.server_name,
            message
        ));
    }

    /// Closing line for this server.
    pub fn summary_line(&self, mode: SweepMode) -> String {
        match (self.matched_count, mode) {
            (0, SweepMode::Live) => format!("No torrents to delete on server {}", self.server_name),
            (0, SweepMode::Debug) => format!(
                "[DEBUG] No matching torrents found on server {}",
                self.server_name
            ),
            (n, SweepMode::Live) => format!(
                "Deleted {} torrent(s) on server {} (total size: {})",
                n,
                self.server_name,
                format_size(self.matched_size)
            ),
            (n, SweepMode::Debug) => format!(
                "[DEBUG] Found {} torrent(s) on server {} (total size: {})",
                n,
                self.server_name,
                format_size(self.matched_size)
            ),
        }
    }
}

fn match_line(record: &DeletionRecord, mode: SweepMode) -> String {
    format!(
        "[{}] {}server[{}] {} torrent: {} (size: {})",
        format_timestamp(&record.timestamp),
        mode.prefix(),
        record.server_name,
        record.action.as_str(),
        record.torrent_name,
        format_size(record.torrent_size)
    )
}

/// Result of one server's worker.
#[derive(Debug, Clone)]
pub enum ServerOutcome {
    /// Every match on the server was processed.
    Success(ServerReport),
    /// The server stopped early. `report` holds whatever was processed first.
    Failure {
        report: ServerReport,
        stage: FailureStage,
        reason: String,
    },
}

impl ServerOutcome {
    pub fn report(&self) -> &ServerReport {
        match self {
            ServerOutcome::Success(report) => report,
            ServerOutcome::Failure { report, .. } => report,
        }
    }

    pub fn into_report(self) -> ServerReport {
        match self {
            ServerOutcome::Success(report) => report,
            ServerOutcome::Failure { report, .. } => report,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServerOutcome::Success(_))
    }

    pub fn server_name(&self) -> &str {
        &self.report().server_name
    }
}

/// Totals of a sweep. Printed, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_matched: usize,
    pub total_size: u64,
    /// Servers that stopped early, in merge order.
    pub failed_servers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(name: &str, size: u64, mode: SweepMode) -> DeletionRecord {
        DeletionRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            server_name: "box-1".to_string(),
            torrent_name: name.to_string(),
            torrent_hash: "abc".to_string(),
            torrent_size: size,
            action: mode.action(),
            debug_mode: mode.is_debug(),
        }
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(SweepMode::from_debug_flag(true), SweepMode::Debug);
        assert_eq!(SweepMode::from_debug_flag(false), SweepMode::Live);
        assert_eq!(SweepMode::Live.action(), DeletionAction::Deleted);
        assert_eq!(SweepMode::Debug.action(), DeletionAction::Found);
    }

    #[test]
    fn test_push_match_accumulates() {
        let mut report = ServerReport::new("box-1");
        report.push_match(record("A", 1024, SweepMode::Live), SweepMode::Live);
        report.push_match(record("B", 2048, SweepMode::Live), SweepMode::Live);

        assert_eq!(report.matched_count, 2);
        assert_eq!(report.matched_size, 3072);
        assert_eq!(report.records.len(), 2);
        assert_eq!(
            report.log_lines[0],
            "[2024-01-02 03:04:05] server[box-1] deleted torrent: A (size: 1.00 KB)"
        );
    }

    #[test]
    fn test_debug_lines_are_prefixed() {
        let mut report = ServerReport::new("box-1");
        report.push_match(record("A", 1073741824, SweepMode::Debug), SweepMode::Debug);
        assert_eq!(
            report.log_lines[0],
            "[2024-01-02 03:04:05] [DEBUG] server[box-1] found torrent: A (size: 1.00 GB)"
        );
        assert_eq!(
            report.summary_line(SweepMode::Debug),
            "[DEBUG] Found 1 torrent(s) on server box-1 (total size: 1.00 GB)"
        );
    }

    #[test]
    fn test_summary_line_without_matches() {
        let report = ServerReport::new("box-2");
        assert_eq!(
            report.summary_line(SweepMode::Live),
            "No torrents to delete on server box-2"
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = ServerOutcome::Failure {
            report: ServerReport::new("box-3"),
            stage: FailureStage::Authenticate,
            reason: "Invalid credentials".to_string(),
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.server_name(), "box-3");
        assert_eq!(FailureStage::Delete.to_string(), "delete");
    }
}
