use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{now_local, DeletionRecord, LedgerError, LedgerState};

/// The part of a record store that loading cares about.
///
/// `last_update` and `total_records` are derived on every persist, so a store
/// missing them still loads.
#[derive(Deserialize)]
struct StoredRecords {
    #[serde(default)]
    records: Vec<Value>,
}

/// File-backed deletion ledger.
///
/// Holds every record from previous sweeps plus the ones merged during this
/// one. Callers share it behind a single lock; nothing in here synchronises.
#[derive(Debug)]
pub struct Ledger {
    log_file: PathBuf,
    records_file: PathBuf,
    records: Vec<DeletionRecord>,
    loaded: usize,
}

impl Ledger {
    /// Create the log directory if needed and load the existing record store.
    pub fn open(log_file: PathBuf, records_file: PathBuf) -> Result<Self, LedgerError> {
        for dir in [log_file.parent(), records_file.parent()].into_iter().flatten() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let records = Self::load(&records_file);
        let loaded = records.len();
        debug!(path = %records_file.display(), records = loaded, "Ledger loaded");

        Ok(Self {
            log_file,
            records_file,
            records,
            loaded,
        })
    }

    /// Read the records from a store file.
    ///
    /// A missing or unreadable store is treated as empty rather than fatal.
    pub fn load(path: &Path) -> Vec<DeletionRecord> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read record store, starting empty");
                return Vec::new();
            }
        };

        let stored = match serde_json::from_str::<StoredRecords>(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Record store is corrupt, starting empty");
                return Vec::new();
            }
        };

        stored
            .records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %path.display(), index = idx, error = %e, "Dropping unreadable record");
                    None
                }
            })
            .collect()
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn records_file(&self) -> &Path {
        &self.records_file
    }

    /// All records: the loaded history followed by this sweep's merges.
    pub fn records(&self) -> &[DeletionRecord] {
        &self.records
    }

    /// Records merged since the ledger was opened.
    pub fn new_records(&self) -> &[DeletionRecord] {
        &self.records[self.loaded..]
    }

    /// Take ownership of a worker's records.
    pub fn extend(&mut self, records: Vec<DeletionRecord>) {
        self.records.extend(records);
    }

    /// Append one line to the text log, opening and closing the file per call.
    pub fn append_line(&self, line: &str) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Rewrite the record store with every record, stamped with the current time.
    pub fn persist(&self) -> Result<LedgerState, LedgerError> {
        let state = LedgerState::new(self.records.clone(), now_local());
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        fs::write(&self.records_file, json)?;
        debug!(
            path = %self.records_file.display(),
            records = state.total_records,
            "Record store written"
        );
        Ok(state)
    }
}
