use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use docsis_core::ports::{ActivityStore, CmtsStore, JobStore, ModemStore, RuleStore};
use docsis_core::types::ModemFilter;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct MetricsBody {
    cmts_total: usize,
    modems_total: usize,
    rules_total: usize,
    jobs_total: i64,
    jobs_by_status: HashMap<String, i64>,
    activity_total: i64,
}

/// Spec.md §6 `metrics()`: aggregated counts per entity and per job status.
pub async fn metrics(State(state): State<AppState>) -> Result<Json<MetricsBody>, AppError> {
    Ok(Json(build_metrics(&state).await?))
}

pub(crate) async fn build_metrics(state: &AppState) -> Result<MetricsBody, AppError> {
    let cmts_total = state.store.list_cmts().await?.len();
    let modems_total = state.store.list_modems(ModemFilter::default()).await?.len();
    let rules_total = state.store.list_rules().await?.len();
    let by_status = state.store.count_jobs_by_status().await?;
    let jobs_total = by_status.iter().map(|(_, count)| count).sum();
    let jobs_by_status = by_status
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), count))
        .collect();
    let activity_total = state.store.count_activity().await?;

    Ok(MetricsBody {
        cmts_total,
        modems_total,
        rules_total,
        jobs_total,
        jobs_by_status,
        activity_total,
    })
}
