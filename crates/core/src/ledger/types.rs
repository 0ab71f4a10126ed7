use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in both the text log and the record store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, truncated to the second.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Render a timestamp the way the ledger stores it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// What happened to a matched torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionAction {
    /// Removed from the server together with its files.
    Deleted,
    /// Matched in debug mode; left untouched.
    Found,
}

impl DeletionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionAction::Deleted => "deleted",
            DeletionAction::Found => "found",
        }
    }
}

/// One matched torrent on one server. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRecord {
    #[serde(with = "ledger_time")]
    pub timestamp: NaiveDateTime,
    pub server_name: String,
    pub torrent_name: String,
    pub torrent_hash: String,
    pub torrent_size: u64,
    pub action: DeletionAction,
    pub debug_mode: bool,
}

/// On-disk layout of the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(with = "ledger_time")]
    pub last_update: NaiveDateTime,
    pub total_records: usize,
    pub records: Vec<DeletionRecord>,
}

impl LedgerState {
    /// Snapshot `records` with a consistent count.
    pub fn new(records: Vec<DeletionRecord>, last_update: NaiveDateTime) -> Self {
        Self {
            last_update,
            total_records: records.len(),
            records,
        }
    }
}

mod ledger_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&DeletionAction::Deleted).unwrap(),
            "\"deleted\""
        );
        assert_eq!(
            serde_json::to_string(&DeletionAction::Found).unwrap(),
            "\"found\""
        );
        assert_eq!(DeletionAction::Found.as_str(), "found");
    }

    #[test]
    fn test_record_wire_format() {
        let record = DeletionRecord {
            timestamp: sample_time(),
            server_name: "box-1".to_string(),
            torrent_name: "Show.S01E01".to_string(),
            torrent_hash: "abc".to_string(),
            torrent_size: 1073741824,
            action: DeletionAction::Deleted,
            debug_mode: false,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestamp"], "2024-03-09 14:05:07");
        assert_eq!(value["action"], "deleted");
        assert_eq!(value["torrent_hash"], "abc");
        assert_eq!(value["debug_mode"], false);
    }

    #[test]
    fn test_ledger_state_count_matches_records() {
        let state = LedgerState::new(Vec::new(), sample_time());
        assert_eq!(state.total_records, 0);
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let raw = r#"{"last_update": "yesterday", "total_records": 0, "records": []}"#;
        assert!(serde_json::from_str::<LedgerState>(raw).is_err());
    }

    #[test]
    fn test_now_local_has_no_subseconds() {
        assert_eq!(now_local().nanosecond(), 0);
    }
}
