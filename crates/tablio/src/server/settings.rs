use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::server::error::ApiError;
use crate::server::ServerState;
use crate::settings::{Group, TidyConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertGroupRequest {
    #[serde(default)]
    pub current_name: Option<String>,
    pub group: Group,
}

#[derive(Debug, Deserialize)]
pub struct MoveGroupRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct AssignGroupRequest {
    pub indices: Vec<usize>,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Serialize)]
pub struct AssignGroupResponse {
    pub assigned: usize,
}

/// `GET /settings`: the normalized settings record.
pub(crate) async fn get_settings(State(state): State<Arc<ServerState>>) -> Json<TidyConfig> {
    Json(state.engine.settings().load().await)
}

/// `PUT /settings`: replaces the whole record. The body is normalized the
/// same way a stored record is, so the response shows what a tidy pass will
/// actually see.
pub(crate) async fn put_settings(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<Value>,
) -> Result<Json<TidyConfig>, ApiError> {
    if !payload.is_object() {
        return Err(ApiError::bad_request("settings must be a JSON object"));
    }
    let config = TidyConfig::from_value(&payload);
    state.engine.settings().save(&config).await?;
    Ok(Json(config))
}

/// `POST /settings/groups`: adds a group, or edits `currentName` in place.
pub(crate) async fn upsert_group(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<UpsertGroupRequest>,
) -> Result<Json<TidyConfig>, ApiError> {
    let config = state
        .engine
        .settings()
        .update(|config| {
            config.upsert_group(payload.current_name.as_deref(), payload.group)?;
            Ok(config.clone())
        })
        .await?;
    Ok(Json(config))
}

/// `DELETE /settings/groups/:name`.
pub(crate) async fn remove_group(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let removed = state
        .engine
        .settings()
        .update(|config| config.remove_group(&name))
        .await?;
    Ok(Json(removed))
}

/// `POST /settings/groups/move`: reorders groups, which changes their rank.
pub(crate) async fn move_group(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<MoveGroupRequest>,
) -> Result<Json<TidyConfig>, ApiError> {
    let config = state
        .engine
        .settings()
        .update(|config| {
            config.move_group(payload.from, payload.to);
            Ok(config.clone())
        })
        .await?;
    Ok(Json(config))
}

/// `POST /settings/pairings/assign`: bulk (re)assigns pairings to a group.
pub(crate) async fn assign_group(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<AssignGroupRequest>,
) -> Result<Json<AssignGroupResponse>, ApiError> {
    let assigned = state
        .engine
        .settings()
        .update(|config| Ok(config.assign_group(&payload.indices, &payload.group)))
        .await?;
    Ok(Json(AssignGroupResponse { assigned }))
}

/// `POST /settings/reset`: clears pairings and groups and turns auto-tidy off.
pub(crate) async fn reset_settings(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<TidyConfig>, ApiError> {
    let config = state
        .engine
        .settings()
        .update(|config| {
            config.reset();
            Ok(config.clone())
        })
        .await?;
    Ok(Json(config))
}
