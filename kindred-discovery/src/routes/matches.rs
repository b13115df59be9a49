use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;

use kindred_shared::errors::AppResult;
use kindred_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::services::match_service::{self, MatchSummary};
use crate::store::DiscoveryStore;
use crate::AppState;

use super::blocking;

/// GET /api/matches/:uid - the user's matches, newest first
pub async fn list_matches<S: DiscoveryStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(uid): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<MatchSummary>>>> {
    let store = state.store.clone();
    let page = blocking(move || match_service::list_matches(&store, &uid, &params)).await?;

    Ok(Json(ApiResponse::ok(page)))
}
