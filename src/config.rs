use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::store::Backend;

pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub database_url: String,
    pub cors_origin: String,
    pub seed_demo: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8088"),
            backend: try_load("STORAGE_BACKEND", "memory"),
            database_url: try_load("DATABASE_URL", "sqlite:voteboard.db"),
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:9099"),
            seed_demo: try_load("SEED_DEMO", "false"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
