use axum::extract::State;
use axum::http::StatusCode;
use tracing::{error, info};

use crate::state::AppState;

/// Kicks off an out-of-band discovery sweep and returns immediately.
/// Per spec.md §6, triggers never wait on their result — callers poll the
/// activity feed or the modem list to see the effect.
pub async fn trigger_discovery(State(state): State<AppState>) -> StatusCode {
    let discovery = state.discovery.clone();
    tokio::spawn(async move {
        if let Err(e) = discovery.run_once().await {
            error!(error = %e, "manually triggered discovery sweep failed");
        } else {
            info!("manually triggered discovery sweep complete");
        }
    });
    StatusCode::ACCEPTED
}

pub async fn trigger_rule_evaluation(State(state): State<AppState>) -> StatusCode {
    let evaluator = state.rule_evaluator.clone();
    tokio::spawn(async move {
        if let Err(e) = evaluator.run_once().await {
            error!(error = %e, "manually triggered rule evaluation failed");
        } else {
            info!("manually triggered rule evaluation complete");
        }
    });
    StatusCode::ACCEPTED
}
