use axum::extract::{Path, State};
use axum::Json;
use docsis_core::ports::RuleStore;
use docsis_core::types::{EventType, Id, NewActivityEvent, Rule, RuleInput};

use crate::error::AppError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Rule>>, AppError> {
    Ok(Json(state.store.list_rules().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<Rule>, AppError> {
    Ok(Json(state.store.get_rule(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<RuleInput>,
) -> Result<Json<Rule>, AppError> {
    let rule = state.store.create_rule(input).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::RuleCreated,
            entity_type: "rule".to_string(),
            entity_id: Some(rule.id),
            message: format!("rule '{}' created", rule.name),
            details: None,
        })
        .await;
    Ok(Json(rule))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(input): Json<RuleInput>,
) -> Result<Json<Rule>, AppError> {
    let rule = state.store.update_rule(id, input).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::RuleUpdated,
            entity_type: "rule".to_string(),
            entity_id: Some(rule.id),
            message: format!("rule '{}' updated", rule.name),
            details: None,
        })
        .await;
    Ok(Json(rule))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<axum::http::StatusCode, AppError> {
    state.store.delete_rule(id).await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::RuleDeleted,
            entity_type: "rule".to_string(),
            entity_id: Some(id),
            message: format!("rule {id} deleted"),
            details: None,
        })
        .await;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
