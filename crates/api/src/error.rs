use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Handler failures, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    TradeNotFound,
    Internal(common::Error),
}

impl From<common::Error> for ApiError {
    fn from(e: common::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::TradeNotFound => (StatusCode::NOT_FOUND, "Trade not found".to_string()),
            ApiError::Internal(e) => {
                error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
