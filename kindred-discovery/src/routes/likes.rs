use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use kindred_shared::errors::AppResult;
use kindred_shared::types::ApiResponse;

use crate::services::match_service::{self, LikeOutcome, RecordLikeRequest};
use crate::store::DiscoveryStore;
use crate::AppState;

use super::{blocking, json_body};

/// POST /api/discovery/like - like or super-like a profile, matching on reciprocity
pub async fn record_like<S: DiscoveryStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RecordLikeRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<LikeOutcome>>> {
    let req = json_body(payload)?;
    let store = state.store.clone();
    let outcome = blocking(move || match_service::record_like(&store, req)).await?;

    Ok(Json(ApiResponse::ok(outcome)))
}
