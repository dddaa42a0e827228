use axum::extract::{Path, Query, State};
use axum::Json;
use docsis_core::ports::ModemStore;
use docsis_core::types::{Id, Modem, ModemFilter};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListModemsQuery {
    cmts_id: Option<Id>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListModemsQuery>,
) -> Result<Json<Vec<Modem>>, AppError> {
    let filter = ModemFilter {
        cmts_id: query.cmts_id,
    };
    Ok(Json(state.store.list_modems(filter).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<Modem>, AppError> {
    Ok(Json(state.store.get_modem(id).await?))
}
