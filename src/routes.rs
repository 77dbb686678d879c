use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::AppError,
    identity::Identity,
    models::{NewFeature, StatusUpdate, VoteStatus},
    state::AppState,
    store::{FeatureRepo, Storage},
    utils::{parse_feature_id, parse_status},
};

pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    state.store.health_check().await?;
    Ok(Json(json!({ "status": "ok", "service": "voteboard" })))
}

pub async fn list_features_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let features = state.store.list_features().await?;
    Ok(Json(features))
}

pub async fn get_feature_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_feature_id(&id)?;
    let feature = state.store.feature(id).await?;
    Ok(Json(feature))
}

pub async fn create_feature_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewFeature>,
) -> Result<impl IntoResponse, AppError> {
    let feature = state.store.create_feature(payload).await?;
    info!(id = feature.id, "feature created");
    Ok((StatusCode::CREATED, Json(feature)))
}

pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_feature_id(&id)?;
    let status = parse_status(&payload.status)?;

    let feature = state.store.set_status(id, status).await?;
    info!(id, status = status.as_str(), "feature status updated");
    Ok(Json(feature))
}

pub async fn cast_vote_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_feature_id(&id)?;
    let session_id = identity.0.ok_or(AppError::IdentityMissing)?;

    let feature = state.voting.cast_vote(id, &session_id).await?;
    Ok(Json(feature))
}

pub async fn vote_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_feature_id(&id)?;

    let voted = state
        .voting
        .check_vote_status(id, identity.0.as_deref())
        .await?;
    Ok(Json(VoteStatus { voted }))
}
