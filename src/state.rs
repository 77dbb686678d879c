use std::sync::Arc;

use tracing::info;

use super::{
    config::Config,
    seed,
    store::{Backend, Storage, memory::MemoryStore, sqlite::SqliteStore},
    voting::VotingService,
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Storage>,
    pub voting: VotingService,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn Storage> = match config.backend {
            Backend::Memory => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
            Backend::Sqlite => {
                info!("Using sqlite storage at {}", config.database_url);
                Arc::new(
                    SqliteStore::new(&config.database_url)
                        .await
                        .expect("Database misconfigured!"),
                )
            }
        };

        if config.seed_demo {
            seed::seed_demo(&store).await;
        }

        Self::with_store(config, store)
    }

    /// Wires the state around an already-constructed store. Tests use this
    /// to inject a fresh backend per case.
    pub fn with_store(config: Config, store: Arc<dyn Storage>) -> Arc<Self> {
        let voting = VotingService::new(store.clone());

        Arc::new(Self {
            config,
            store,
            voting,
        })
    }
}
