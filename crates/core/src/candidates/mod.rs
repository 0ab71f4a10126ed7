//! Deletion candidates.
//!
//! The candidate file is produced by a separate discovery step. A sweep only
//! reads it, and only ever asks one question of it: is this torrent name a
//! candidate?

mod types;

pub use types::*;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CandidateLoadError {
    #[error("Candidate file not found: {0}")]
    NotFound(String),

    #[error("Failed to read candidate file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Candidate file is not valid JSON: {0}")]
    Parse(String),

    #[error("Candidate file must contain a JSON array at the root")]
    NotAnArray,
}

/// Load the candidate set from a JSON file.
///
/// Fails if the file is missing, unreadable, malformed, or its root is not an
/// array. No partial set is ever returned.
pub fn load_candidates(path: &Path) -> Result<CandidateSet, CandidateLoadError> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CandidateLoadError::NotFound(path.display().to_string()),
        _ => CandidateLoadError::Io(e),
    })?;

    let set = parse_candidates(&raw)?;
    debug!(path = %path.display(), candidates = set.len(), "Loaded candidate set");
    Ok(set)
}

/// Parse a candidate list from its JSON text.
pub fn parse_candidates(raw: &str) -> Result<CandidateSet, CandidateLoadError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CandidateLoadError::Parse(e.to_string()))?;

    if !value.is_array() {
        return Err(CandidateLoadError::NotAnArray);
    }

    let entries: Vec<CandidateEntry> =
        serde_json::from_value(value).map_err(|e| CandidateLoadError::Parse(e.to_string()))?;

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        let candidate = entry.into_candidate();
        if candidate.name.is_empty() {
            warn!("Skipping candidate with empty name");
            continue;
        }
        candidates.push(candidate);
    }

    Ok(CandidateSet::new(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_entries() {
        let raw = r#"[
            {"name": "Show.S01E01", "hash": "abc", "size": 1073741824, "category": "tv", "tags": "stale,seed"},
            {"name": "Movie.2020", "hash": "def", "size": 2048, "category": "", "tags": ["old"]}
        ]"#;
        let set = parse_candidates(raw).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("Show.S01E01"));
        assert!(set.contains("Movie.2020"));
        assert_eq!(set.total_size(), 1073741824 + 2048);
    }

    #[test]
    fn test_parse_bare_names() {
        let set = parse_candidates(r#"["A", {"name": "B"}]"#).unwrap();
        assert!(set.contains("A"));
        assert!(set.contains("B"));
    }

    #[test]
    fn test_parse_skips_empty_names() {
        let set = parse_candidates(r#"["", {"size": 10}, "A"]"#).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.contains(""));
    }

    #[test]
    fn test_parse_tolerates_unusable_sizes() {
        let raw = r#"[
            {"name": "Magnet.NoMeta", "size": -1},
            {"name": "Unknown.Size", "size": null},
            {"name": "Show.S01E01", "size": 5}
        ]"#;
        let set = parse_candidates(raw).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("Magnet.NoMeta"));
        assert!(set.contains("Unknown.Size"));
        assert_eq!(set.total_size(), 5);
    }

    #[test]
    fn test_parse_non_array_root() {
        let err = parse_candidates(r#"{"name": "A"}"#).unwrap_err();
        assert!(matches!(err, CandidateLoadError::NotAnArray));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_candidates("[{").unwrap_err();
        assert!(matches!(err, CandidateLoadError::Parse(_)));
    }

    #[test]
    fn test_parse_wrong_element_type() {
        let err = parse_candidates("[42]").unwrap_err();
        assert!(matches!(err, CandidateLoadError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_candidates(Path::new("/nonexistent/torrents_to_delete.json")).unwrap_err();
        assert!(matches!(err, CandidateLoadError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"[{{"name": "Show.S01E01", "size": 5}}]"#).unwrap();

        let set = load_candidates(temp_file.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("Show.S01E01"));
    }
}
