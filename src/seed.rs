use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{FeatureStatus, NewFeature};
use crate::store::{FeatureRepo, Storage};

/// Sample features for a fresh board. Counts start at zero: a seeded
/// counter with no ledger rows behind it would break the
/// counter-equals-ledger invariant.
const DEMO_FEATURES: [(&str, &str, FeatureStatus); 6] = [
    (
        "Add ability to filter by tags",
        "This will allow enhanced tag-based sorting. Which is very useful to us.",
        FeatureStatus::Pending,
    ),
    (
        "Request to add voice command",
        "I am using the app with only hands free work, I would love to have voice-command experience.",
        FeatureStatus::InProgress,
    ),
    (
        "Real-time cloud synchronization",
        "I love the offline mode, but it would be nice to sync data across devices.",
        FeatureStatus::Approved,
    ),
    (
        "Integrate Timer like Pomodoro",
        "This will allow us to focus more on the task at hand.",
        FeatureStatus::Done,
    ),
    (
        "Ability to attach photos and documents",
        "I would like to be able to add images and PDFs to show what they are about. It would be nice to be able to add a photo.",
        FeatureStatus::Canceled,
    ),
    (
        "Collaboration mode with teams",
        "Would be great to have a way to collaborate with team members on features.",
        FeatureStatus::InProgress,
    ),
];

/// Seeds the demo features into an empty store. A store that already holds
/// features is left untouched.
pub async fn seed_demo(store: &Arc<dyn Storage>) {
    match store.list_features().await {
        Ok(existing) if !existing.is_empty() => {
            info!(
                "store already holds {} features, skipping demo seed",
                existing.len()
            );
            return;
        }
        Err(err) => {
            warn!("could not inspect store before seeding: {err}");
            return;
        }
        Ok(_) => {}
    }

    for (title, description, status) in DEMO_FEATURES {
        let created = store
            .create_feature(NewFeature {
                title: title.to_string(),
                description: Some(description.to_string()),
            })
            .await;

        match created {
            Ok(feature) if status != FeatureStatus::Pending => {
                if let Err(err) = store.set_status(feature.id, status).await {
                    warn!("failed to set status on demo feature {}: {err}", feature.id);
                }
            }
            Ok(_) => {}
            Err(err) => warn!("failed to seed demo feature: {err}"),
        }
    }

    info!("seeded {} demo features", DEMO_FEATURES.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_seed_fills_empty_store_once() {
        let store: Arc<dyn Storage> = Arc::new(MemoryStore::new());

        seed_demo(&store).await;
        let features = store.list_features().await.unwrap();
        assert_eq!(features.len(), 6);
        assert!(features.iter().all(|f| f.votes == 0));
        assert_eq!(features[1].status, FeatureStatus::InProgress);

        // Second run is a no-op.
        seed_demo(&store).await;
        assert_eq!(store.list_features().await.unwrap().len(), 6);
    }
}
