use axum::extract::{Path, State};
use axum::Json;
use docsis_core::ports::CmtsStore;
use docsis_core::types::{Cmts, CmtsInput, EventType, Id, NewActivityEvent};

use crate::error::AppError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Cmts>>, AppError> {
    Ok(Json(state.store.list_cmts().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<Cmts>, AppError> {
    Ok(Json(state.store.get_cmts(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CmtsInput>,
) -> Result<Json<Cmts>, AppError> {
    let cmts = state.store.create_cmts(input).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::CmtsAdded,
            entity_type: "cmts".to_string(),
            entity_id: Some(cmts.id),
            message: format!("cmts '{}' added", cmts.name),
            details: None,
        })
        .await;
    Ok(Json(cmts))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(input): Json<CmtsInput>,
) -> Result<Json<Cmts>, AppError> {
    let cmts = state.store.update_cmts(id, input).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::CmtsUpdated,
            entity_type: "cmts".to_string(),
            entity_id: Some(cmts.id),
            message: format!("cmts '{}' updated", cmts.name),
            details: None,
        })
        .await;
    Ok(Json(cmts))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<axum::http::StatusCode, AppError> {
    state.store.delete_cmts(id).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::CmtsDeleted,
            entity_type: "cmts".to_string(),
            entity_id: Some(id),
            message: format!("cmts {id} deleted"),
            details: None,
        })
        .await;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
