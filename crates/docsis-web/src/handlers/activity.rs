use axum::extract::{Query, State};
use axum::Json;
use docsis_core::ports::ActivityStore;
use docsis_core::types::ActivityEvent;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListActivityQuery {
    limit: Option<i64>,
}

const DEFAULT_LIMIT: i64 = 50;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListActivityQuery>,
) -> Result<Json<Vec<ActivityEvent>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(state.store.list_activity(limit).await?))
}
