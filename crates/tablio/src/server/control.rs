use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::TidyReport;
use crate::server::error::ApiError;
use crate::server::ServerState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraceBody {
    pub grace_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: usize,
}

/// `POST /tidy`: runs a pass on the last-focused window right away.
#[tracing::instrument(skip_all)]
pub(crate) async fn tidy_now(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<TidyReport>, ApiError> {
    let report = state.engine.tidy().await.map_err(ApiError::from)?;
    Ok(Json(report))
}

/// `POST /ephemeral/clear`: forgets every sticky preview tab.
pub(crate) async fn clear_ephemeral(State(state): State<Arc<ServerState>>) -> Json<ClearedResponse> {
    Json(ClearedResponse {
        cleared: state.engine.clear_ephemeral(),
    })
}

/// `GET /ephemeral/grace`: current promotion grace period.
pub(crate) async fn get_grace(State(state): State<Arc<ServerState>>) -> Json<GraceBody> {
    Json(grace_body(state.engine.grace_period()))
}

/// `PUT /ephemeral/grace`: changes the promotion grace period.
pub(crate) async fn set_grace(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<GraceBody>,
) -> Json<GraceBody> {
    state
        .engine
        .set_grace_period(Duration::from_millis(payload.grace_ms));
    tracing::info!("ephemeral grace period set to {} ms", payload.grace_ms);
    Json(grace_body(state.engine.grace_period()))
}

fn grace_body(grace: Duration) -> GraceBody {
    GraceBody {
        grace_ms: u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
    }
}
