use std::sync::Arc;

use tracing::debug;

use crate::error::AppError;
use crate::models::Feature;
use crate::store::{FeatureRepo, Storage, VoteRepo};

/// Orchestrates vote casting across the feature store and the vote ledger.
/// Owns neither: it checks in order and lets the ledger's atomic
/// check-then-insert settle any race it cannot see.
#[derive(Clone)]
pub struct VotingService {
    store: Arc<dyn Storage>,
}

impl VotingService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Ordered checks, short-circuiting on the first failure:
    /// the feature must exist, the session must not have voted yet, then
    /// the ledger records the vote (re-checking atomically, so the loser of
    /// a same-pair race fails with `AlreadyVoted`). Returns the
    /// post-increment feature.
    pub async fn cast_vote(&self, feature_id: i64, session_id: &str) -> Result<Feature, AppError> {
        self.store.feature(feature_id).await?;

        if self.store.has_voted(feature_id, session_id).await? {
            return Err(AppError::AlreadyVoted);
        }

        let vote = self.store.record_vote(feature_id, session_id).await?;
        debug!(feature_id, vote_id = vote.id, "vote recorded");

        self.store.feature(feature_id).await
    }

    /// Read-through to the ledger. A session that was never issued cannot
    /// have voted, so an absent identity reads as `false`, not an error.
    pub async fn check_vote_status(
        &self,
        feature_id: i64,
        session_id: Option<&str>,
    ) -> Result<bool, AppError> {
        match session_id {
            Some(session_id) => self.store.has_voted(feature_id, session_id).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureStatus, NewFeature};
    use crate::store::FeatureRepo;
    use crate::store::memory::MemoryStore;

    fn service() -> (Arc<MemoryStore>, VotingService) {
        let store = Arc::new(MemoryStore::new());
        let voting = VotingService::new(store.clone());
        (store, voting)
    }

    async fn seeded_feature(store: &MemoryStore) -> i64 {
        store
            .create_feature(NewFeature {
                title: "Add dark mode".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_cast_vote_scenario() {
        let (store, voting) = service();
        let id = seeded_feature(&store).await;

        let feature = voting.cast_vote(id, "sess-A").await.unwrap();
        assert_eq!(feature.votes, 1);

        assert!(matches!(
            voting.cast_vote(id, "sess-A").await,
            Err(AppError::AlreadyVoted)
        ));

        let feature = voting.cast_vote(id, "sess-B").await.unwrap();
        assert_eq!(feature.votes, 2);

        assert!(voting.check_vote_status(id, Some("sess-A")).await.unwrap());

        let feature = store.set_status(id, FeatureStatus::Approved).await.unwrap();
        assert_eq!(feature.status, FeatureStatus::Approved);
        assert_eq!(feature.votes, 2);
    }

    #[tokio::test]
    async fn test_missing_feature_beats_already_voted() {
        let (_, voting) = service();

        assert!(matches!(
            voting.cast_vote(42, "sess-A").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_vote_status_without_identity() {
        let (store, voting) = service();
        let id = seeded_feature(&store).await;

        assert!(!voting.check_vote_status(id, None).await.unwrap());
        assert!(!voting.check_vote_status(id, Some("sess-A")).await.unwrap());

        voting.cast_vote(id, "sess-A").await.unwrap();
        assert!(voting.check_vote_status(id, Some("sess-A")).await.unwrap());
        // Stays true on repeated reads.
        assert!(voting.check_vote_status(id, Some("sess-A")).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_distinct_sessions_all_count() {
        let (store, voting) = service();
        let id = seeded_feature(&store).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let voting = voting.clone();
            handles.push(tokio::spawn(async move {
                voting.cast_vote(id, &format!("sess-{i}")).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(store.feature(id).await.unwrap().votes, 16);
    }

    #[tokio::test]
    async fn test_same_pair_race_counts_once() {
        let (store, voting) = service();
        let id = seeded_feature(&store).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let voting = voting.clone();
            handles.push(tokio::spawn(
                async move { voting.cast_vote(id, "sess-A").await },
            ));
        }

        let mut wins = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(AppError::AlreadyVoted) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.feature(id).await.unwrap().votes, 1);
    }
}
