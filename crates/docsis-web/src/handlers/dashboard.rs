use axum::extract::State;
use axum::Json;
use docsis_core::ports::ActivityStore;
use docsis_core::types::ActivityEvent;
use serde::Serialize;

use super::metrics::{build_metrics, MetricsBody};
use crate::error::AppError;
use crate::state::AppState;

const RECENT_ACTIVITY_LIMIT: i64 = 10;

#[derive(Serialize)]
pub struct DashboardBody {
    summary: MetricsBody,
    recent_activity: Vec<ActivityEvent>,
}

/// Spec.md §6 `dashboard()`: summary + recent activity (last 10).
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardBody>, AppError> {
    let summary = build_metrics(&state).await?;
    let recent_activity = state.store.list_activity(RECENT_ACTIVITY_LIMIT).await?;
    Ok(Json(DashboardBody {
        summary,
        recent_activity,
    }))
}
