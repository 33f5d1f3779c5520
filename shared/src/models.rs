use serde::{Serialize, Deserialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    pub choice: String,
    pub count: i64,
}

/// Point-in-time vote counts, one entry per choice in registry order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Tally {
    entries: Vec<TallyEntry>,
}

impl Tally {
    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    pub fn get(&self, choice: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|entry| entry.choice == choice)
            .map(|entry| entry.count)
    }
}

impl FromIterator<(String, i64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(choice, count)| TallyEntry { choice, count })
                .collect(),
        }
    }
}

/// Body of a vote submission, either as an HTML form or as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(rocket::FromForm))]
pub struct VoteForm {
    pub vote: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VoteOutcome {
    Accepted,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub tally: Tally,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub message: String,
}

impl HealthResponse {
    pub fn pong() -> Self {
        Self { message: "pong".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub store_failures: u64,
    pub votes_accepted: u64,
    pub votes_rejected: u64,
    pub resets: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_reset_at: Option<OffsetDateTime>,
}
