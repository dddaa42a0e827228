use axum::extract::{Path, Query, State};
use axum::Json;
use docsis_core::clock::now_unix;
use docsis_core::ports::JobStore;
use docsis_core::types::{Id, Job, JobFilter, JobStatus};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListJobsQuery {
    status: Option<String>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let status = query
        .status
        .map(|s| s.parse::<JobStatus>())
        .transpose()?;
    let filter = JobFilter {
        status,
        limit: query.limit,
    };
    Ok(Json(state.store.list_jobs(filter).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.store.get_job(id).await?))
}

/// Manually re-queues a job. Returns 202 immediately; the actual retry
/// happens on the next job-dispatch scheduler tick, same as spec.md §6
/// states for every asynchronous trigger.
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<(axum::http::StatusCode, Json<Job>), AppError> {
    let job = state.store.retry_job(id, now_unix()).await?;
    Ok((axum::http::StatusCode::ACCEPTED, Json(job)))
}
