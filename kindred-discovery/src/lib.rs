pub mod compatibility;
pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use kindred_shared::middleware::metrics_middleware;

use crate::config::AppConfig;
use crate::store::DiscoveryStore;

pub struct AppState<S> {
    pub store: S,
    pub config: AppConfig,
    /// `None` when no Prometheus recorder is installed, e.g. in tests.
    pub metrics_handle: Option<PrometheusHandle>,
}

pub fn build_router<S: DiscoveryStore>(state: Arc<AppState<S>>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/health", get(routes::health::health_check::<S>))
        .route("/metrics", get(routes::health::metrics::<S>))
        .route("/api/quiz/save", post(routes::quiz::save_quiz::<S>))
        .route("/api/quiz/:uid", get(routes::quiz::get_quiz::<S>))
        .route("/api/discovery/like", post(routes::likes::record_like::<S>))
        .route("/api/matches/:uid", get(routes::matches::list_matches::<S>))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
