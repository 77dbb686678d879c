//! Feature-request voting board.
//!
//! Users submit feature ideas, vote once per idea, and an admin moves ideas
//! through their lifecycle. The vote ledger is the source of truth for "has
//! this session voted": one row per (feature, session) pair, and a
//! feature's stored counter always equals the number of ledger rows behind
//! it.
//!
//!
//!
//! # Endpoints
//! - `GET /health` liveness plus a storage ping
//! - `GET /api/features` list all features
//! - `POST /api/features` submit a feature
//! - `GET /api/features/{id}` fetch one feature
//! - `PUT /api/features/{id}/status` admin status change
//! - `POST /api/features/{id}/vote` cast a vote for the current session
//! - `GET /api/features/{id}/voted` has the current session voted
//!
//!
//!
//! # Identity
//!
//! Voters are identified by an opaque session cookie minted on first
//! contact. The token is the dedup key for votes; see [`identity`].
//!
//!
//!
//! # Storage
//!
//! Two interchangeable backings behind one contract, picked with
//! `STORAGE_BACKEND`:
//! - `memory` process-local maps, fresh on every start
//! - `sqlite` relational tables at `DATABASE_URL`, survives restarts
//!
//!
//!
//! # Setup
//!
//! ```sh
//! RUST_LOG=info STORAGE_BACKEND=memory SEED_DEMO=true cargo run
//! ```

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod utils;
pub mod voting;

use routes::{
    cast_vote_handler, create_feature_handler, get_feature_handler, health_handler,
    list_features_handler, update_status_handler, vote_status_handler,
};
use state::AppState;

/// Builds the full router around an existing state. Exposed so tests can
/// drive the API without going through `start_server`.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(
            state
                .config
                .cors_origin
                .parse::<HeaderValue>()
                .expect("Environment misconfigured!"),
        )
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/features",
            get(list_features_handler).post(create_feature_handler),
        )
        .route("/api/features/{id}", get(get_feature_handler))
        .route("/api/features/{id}/status", put(update_status_handler))
        .route("/api/features/{id}/vote", post(cast_vote_handler))
        .route("/api/features/{id}/voted", get(vote_status_handler))
        .layer(middleware::from_fn(identity::resolve_session))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
