//! Storage contract for the board: feature records on one side, the vote
//! ledger on the other. Two interchangeable backings implement the same
//! contract, picked at startup via [`Backend`].

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Feature, FeatureStatus, NewFeature, Vote};

pub mod memory;
pub mod sqlite;

/// Feature records and their vote counters.
#[async_trait]
pub trait FeatureRepo {
    async fn list_features(&self) -> Result<Vec<Feature>, AppError>;

    async fn feature(&self, id: i64) -> Result<Feature, AppError>;

    /// Assigns the next id and stores the feature as `pending` with zero
    /// votes. Fails with a validation error when the trimmed title is
    /// outside the 3..=100 character bounds.
    async fn create_feature(&self, new: NewFeature) -> Result<Feature, AppError>;

    /// Overwrites the status field only.
    async fn set_status(&self, id: i64, status: FeatureStatus) -> Result<Feature, AppError>;

    /// Atomic read-modify-write: concurrent increments for the same id must
    /// not lose updates.
    async fn increment_votes(&self, id: i64) -> Result<Feature, AppError>;
}

/// The vote ledger: one row per (feature, session) pair, immutable, never
/// deleted.
#[async_trait]
pub trait VoteRepo {
    async fn has_voted(&self, feature_id: i64, session_id: &str) -> Result<bool, AppError>;

    /// Check-then-insert as a single atomic step: a duplicate pair fails
    /// with `AlreadyVoted` even when two casts race. The feature counter
    /// moves in the same atomic unit as the ledger row, so the two can
    /// never be observed out of sync.
    async fn record_vote(&self, feature_id: i64, session_id: &str) -> Result<Vote, AppError>;
}

/// Combined storage contract, held behind an `Arc<dyn Storage>` by the
/// application state.
#[async_trait]
pub trait Storage: FeatureRepo + VoteRepo + Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Which backing to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!("SQLite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("postgres".parse::<Backend>().is_err());
    }
}
