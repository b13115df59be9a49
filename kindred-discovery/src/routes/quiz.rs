use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use kindred_shared::errors::AppResult;
use kindred_shared::types::ApiResponse;

use crate::models::QuizResult;
use crate::services::quiz_service::{self, SubmitQuizRequest};
use crate::store::DiscoveryStore;
use crate::AppState;

use super::{blocking, json_body};

#[derive(Debug, Serialize)]
pub struct QuizPayload {
    pub quiz: QuizResult,
}

// --- POST /api/quiz/save ---

pub async fn save_quiz<S: DiscoveryStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<QuizPayload>>> {
    let req = json_body(payload)?;
    let store = state.store.clone();
    let quiz = blocking(move || quiz_service::submit_quiz(&store, req)).await?;

    Ok(Json(ApiResponse::ok_with_message(
        QuizPayload { quiz },
        "Quiz results saved successfully",
    )))
}

// --- GET /api/quiz/:uid ---

pub async fn get_quiz<S: DiscoveryStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(uid): Path<String>,
) -> AppResult<Json<ApiResponse<QuizPayload>>> {
    let store = state.store.clone();
    let quiz = blocking(move || quiz_service::get_quiz(&store, &uid)).await?;

    Ok(Json(ApiResponse::ok(QuizPayload { quiz })))
}
