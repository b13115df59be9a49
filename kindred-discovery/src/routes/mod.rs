pub mod health;
pub mod likes;
pub mod matches;
pub mod quiz;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use kindred_shared::errors::{AppError, AppResult};

/// Runs store work on tokio's blocking pool; diesel connections are synchronous.
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(AppError::internal)?
}

/// Unwraps a JSON body. A body that does not parse is reported as an
/// internal error, with the parser's reason kept in the logs only.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::internal(anyhow::anyhow!("unreadable request body: {}", rejection.body_text())))
}
