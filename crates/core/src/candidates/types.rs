use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A torrent previously identified as eligible for remote deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Torrent name; the only field used for matching.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Info hash on the server it was discovered on. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Size in bytes. Negative, null or non-integer sizes read as 0.
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    /// Tags, accepted either as an array or as qBittorrent's comma-separated string.
    #[serde(default, deserialize_with = "tags_list")]
    pub tags: Vec<String>,
}

/// One element of the candidate file: a full object or just a name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CandidateEntry {
    Name(String),
    Full(Candidate),
}

impl CandidateEntry {
    pub(crate) fn into_candidate(self) -> Candidate {
        match self {
            CandidateEntry::Name(name) => Candidate {
                name,
                hash: None,
                size: 0,
                category: None,
                tags: Vec::new(),
            },
            CandidateEntry::Full(candidate) => candidate,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Size is informational; a bad value must not reject the whole file.
fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn tags_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Tags::List(tags)) => tags,
        Some(Tags::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
    })
}

/// Immutable set of candidates, matched by exact, case-sensitive name.
///
/// Name is the uniqueness key: two unrelated torrents with the same name on
/// different servers cannot be told apart.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    names: HashSet<String>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let names = candidates.iter().map(|c| c.name.clone()).collect();
        Self { candidates, names }
    }

    /// Build a set from bare names (useful for testing).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| CandidateEntry::Name(name.into()).into_candidate())
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Sum of the candidates' recorded sizes.
    pub fn total_size(&self) -> u64 {
        self.candidates.iter().map(|c| c.size).sum()
    }
}
