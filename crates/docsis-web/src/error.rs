use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docsis_core::CoreError;
use serde::Serialize;

/// Wraps `CoreError` so `IntoResponse` can be implemented here without
/// violating the orphan rule (`docsis-core` knows nothing about axum).
pub struct AppError(pub CoreError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}
