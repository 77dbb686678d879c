//! # In-memory backing
//!
//! Process-local maps behind a single `RwLock`, the default backing for
//! development and tests.
//!
//! - Features keyed by id, votes grouped by feature id
//! - Ids handed out from monotonically increasing counters
//! - `record_vote` does the duplicate check, ledger append, and counter
//!   increment inside one write-lock section, so the check-then-insert pair
//!   is atomic and the counter always equals the ledger
//! - Reads take the read lock only, no coordination between readers

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{FeatureRepo, Storage, VoteRepo};
use crate::error::AppError;
use crate::models::{Feature, FeatureStatus, NewFeature, Vote};
use crate::utils::validate_title;

struct Inner {
    features: HashMap<i64, Feature>,
    votes: HashMap<i64, Vec<Vote>>,
    next_feature_id: i64,
    next_vote_id: i64,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                features: HashMap::new(),
                votes: HashMap::new(),
                next_feature_id: 1,
                next_vote_id: 1,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn voted(inner: &Inner, feature_id: i64, session_id: &str) -> bool {
    inner
        .votes
        .get(&feature_id)
        .is_some_and(|votes| votes.iter().any(|vote| vote.session_id == session_id))
}

#[async_trait]
impl FeatureRepo for MemoryStore {
    async fn list_features(&self) -> Result<Vec<Feature>, AppError> {
        let inner = self.read()?;
        let mut features: Vec<Feature> = inner.features.values().cloned().collect();
        features.sort_by_key(|feature| feature.id);
        Ok(features)
    }

    async fn feature(&self, id: i64) -> Result<Feature, AppError> {
        self.read()?
            .features
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create_feature(&self, new: NewFeature) -> Result<Feature, AppError> {
        let title = validate_title(&new.title)?;

        let mut inner = self.write()?;
        let id = inner.next_feature_id;
        inner.next_feature_id += 1;

        let feature = Feature {
            id,
            title,
            description: new.description.unwrap_or_default(),
            status: FeatureStatus::Pending,
            votes: 0,
            created_at: Utc::now(),
        };
        inner.features.insert(id, feature.clone());

        Ok(feature)
    }

    async fn set_status(&self, id: i64, status: FeatureStatus) -> Result<Feature, AppError> {
        let mut inner = self.write()?;
        let feature = inner.features.get_mut(&id).ok_or(AppError::NotFound)?;
        feature.status = status;
        Ok(feature.clone())
    }

    async fn increment_votes(&self, id: i64) -> Result<Feature, AppError> {
        let mut inner = self.write()?;
        let feature = inner.features.get_mut(&id).ok_or(AppError::NotFound)?;
        feature.votes += 1;
        Ok(feature.clone())
    }
}

#[async_trait]
impl VoteRepo for MemoryStore {
    async fn has_voted(&self, feature_id: i64, session_id: &str) -> Result<bool, AppError> {
        let inner = self.read()?;
        Ok(voted(&inner, feature_id, session_id))
    }

    async fn record_vote(&self, feature_id: i64, session_id: &str) -> Result<Vote, AppError> {
        let mut inner = self.write()?;

        if !inner.features.contains_key(&feature_id) {
            return Err(AppError::NotFound);
        }
        if voted(&inner, feature_id, session_id) {
            return Err(AppError::AlreadyVoted);
        }

        let id = inner.next_vote_id;
        inner.next_vote_id += 1;

        let vote = Vote {
            id,
            feature_id,
            session_id: session_id.to_string(),
            created_at: Utc::now(),
        };
        inner.votes.entry(feature_id).or_default().push(vote.clone());

        // Counter and ledger row land under the same lock.
        if let Some(feature) = inner.features.get_mut(&feature_id) {
            feature.votes += 1;
        }

        Ok(vote)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_feature(title: &str) -> NewFeature {
        NewFeature {
            title: title.to_string(),
            description: Some("a description".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_defaults() {
        let store = MemoryStore::new();

        let feature = store.create_feature(new_feature("Add dark mode")).await.unwrap();
        assert_eq!(feature.id, 1);
        assert_eq!(feature.status, FeatureStatus::Pending);
        assert_eq!(feature.votes, 0);

        let second = store.create_feature(new_feature("Another idea")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_titles() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.create_feature(new_feature("ab")).await,
            Err(AppError::Validation(_))
        ));

        // Nothing persisted after a rejected create.
        assert!(store.list_features().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_feature_is_not_found() {
        let store = MemoryStore::new();

        assert!(matches!(store.feature(7).await, Err(AppError::NotFound)));
        assert!(matches!(
            store.set_status(7, FeatureStatus::Done).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            store.record_vote(7, "sess-A").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_record_vote_deduplicates() {
        let store = MemoryStore::new();
        let feature = store.create_feature(new_feature("Add dark mode")).await.unwrap();

        assert!(!store.has_voted(feature.id, "sess-A").await.unwrap());

        store.record_vote(feature.id, "sess-A").await.unwrap();
        assert!(store.has_voted(feature.id, "sess-A").await.unwrap());
        assert_eq!(store.feature(feature.id).await.unwrap().votes, 1);

        assert!(matches!(
            store.record_vote(feature.id, "sess-A").await,
            Err(AppError::AlreadyVoted)
        ));
        assert_eq!(store.feature(feature.id).await.unwrap().votes, 1);

        // A different session still goes through.
        store.record_vote(feature.id, "sess-B").await.unwrap();
        assert_eq!(store.feature(feature.id).await.unwrap().votes, 2);
    }

    #[tokio::test]
    async fn test_set_status_leaves_votes_alone() {
        let store = MemoryStore::new();
        let feature = store.create_feature(new_feature("Add dark mode")).await.unwrap();
        store.record_vote(feature.id, "sess-A").await.unwrap();

        let updated = store
            .set_status(feature.id, FeatureStatus::Approved)
            .await
            .unwrap();
        assert_eq!(updated.status, FeatureStatus::Approved);
        assert_eq!(updated.votes, 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        let feature = store.create_feature(new_feature("Add dark mode")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let id = feature.id;
            handles.push(tokio::spawn(async move {
                store.increment_votes(id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.feature(feature.id).await.unwrap().votes, 32);
    }
}
