use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kindred_shared::{HealthCheck, HealthResponse, HealthStatus};
use std::sync::Arc;

use crate::store::DiscoveryStore;
use crate::AppState;

use super::blocking;

/// Liveness plus a round trip to the backing store.
pub async fn health_check<S: DiscoveryStore>(State(state): State<Arc<AppState<S>>>) -> Response {
    let store = state.store.clone();
    let name = format!("store:{}", store.backend());

    let check = match blocking(move || store.ping()).await {
        Ok(()) => HealthCheck::healthy(name),
        Err(e) => {
            tracing::warn!(error = %e, check = %name, "store ping failed");
            HealthCheck::unhealthy(name, "store unreachable")
        }
    };

    let response = HealthResponse::healthy("kindred-discovery", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![check]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics<S: DiscoveryStore>(State(state): State<Arc<AppState<S>>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
