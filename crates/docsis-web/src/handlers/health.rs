use axum::extract::State;
use axum::Json;
use docsis_core::ports::CmtsStore;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    version: &'static str,
    db: &'static str,
    total_cmts: i64,
}

/// Spec.md §6: `{status, version, db: connected, total_cmts}`, `unhealthy`
/// when the store can't be reached. Always returns 200 — the `status` field
/// carries the verdict, matching every other asynchronous status endpoint in
/// this API.
pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    match state.store.list_cmts().await {
        Ok(cmts) => Json(HealthBody {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            db: "connected",
            total_cmts: cmts.len() as i64,
        }),
        Err(_) => Json(HealthBody {
            status: "unhealthy",
            version: env!("CARGO_PKG_VERSION"),
            db: "unreachable",
            total_cmts: 0,
        }),
    }
}
