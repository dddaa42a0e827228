use axum::extract::State;
use axum::Json;
use docsis_core::clock::now_unix;
use docsis_core::ports::SettingsStore;
use docsis_core::types::{EventType, NewActivityEvent, Setting};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Setting>>, AppError> {
    Ok(Json(state.store.list_settings().await?))
}

#[derive(Deserialize)]
pub struct SetSettingBody {
    key: String,
    value: String,
}

pub async fn set(
    State(state): State<AppState>,
    Json(body): Json<SetSettingBody>,
) -> Result<Json<Setting>, AppError> {
    let setting = state
        .store
        .set_setting(&body.key, &body.value, now_unix())
        .await?;
    let _ = state
        .store
        .record(NewActivityEvent {
            event_type: EventType::SystemEvent,
            entity_type: "setting".to_string(),
            entity_id: None,
            message: format!("setting '{}' changed to '{}'", setting.key, setting.value),
            details: None,
        })
        .await;
    Ok(Json(setting))
}
