use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the full management API surface described in spec.md §6.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/metrics", get(handlers::metrics::metrics))
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/cmts", get(handlers::cmts::list).post(handlers::cmts::create))
        .route(
            "/api/cmts/:id",
            get(handlers::cmts::get)
                .put(handlers::cmts::update)
                .delete(handlers::cmts::delete),
        )
        .route("/api/modems", get(handlers::modem::list))
        .route("/api/modems/:id", get(handlers::modem::get))
        .route("/api/rules", get(handlers::rule::list).post(handlers::rule::create))
        .route(
            "/api/rules/:id",
            get(handlers::rule::get)
                .put(handlers::rule::update)
                .delete(handlers::rule::delete),
        )
        .route("/api/jobs", get(handlers::job::list))
        .route("/api/jobs/:id", get(handlers::job::get))
        .route("/api/jobs/:id/retry", post(handlers::job::retry))
        .route("/api/activity", get(handlers::activity::list))
        .route(
            "/api/settings",
            get(handlers::settings::list).put(handlers::settings::set),
        )
        .route("/api/discovery/trigger", post(handlers::triggers::trigger_discovery))
        .route(
            "/api/rule-evaluation/trigger",
            post(handlers::triggers::trigger_rule_evaluation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
