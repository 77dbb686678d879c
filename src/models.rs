use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a feature request. Only an admin moves a feature out of
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureStatus {
    Pending,
    InProgress,
    Approved,
    Done,
    Canceled,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureStatus::Pending => "pending",
            FeatureStatus::InProgress => "in-progress",
            FeatureStatus::Approved => "approved",
            FeatureStatus::Done => "done",
            FeatureStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<FeatureStatus> {
        match value {
            "pending" => Some(FeatureStatus::Pending),
            "in-progress" => Some(FeatureStatus::InProgress),
            "approved" => Some(FeatureStatus::Approved),
            "done" => Some(FeatureStatus::Done),
            "canceled" => Some(FeatureStatus::Canceled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: FeatureStatus,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

/// One recorded vote. Immutable once written; the pair
/// (`feature_id`, `session_id`) is unique across the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub feature_id: i64,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewFeature {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct VoteStatus {
    pub voted: bool,
}
