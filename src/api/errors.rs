use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::readings::ReadingError;

/// Error half of every handler result, rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ReadingError> for AppError {
    fn from(e: ReadingError) -> Self {
        let status = match &e {
            ReadingError::Validation(_) => StatusCode::BAD_REQUEST,
            ReadingError::UnknownUid | ReadingError::NoReadings => StatusCode::NOT_FOUND,
            ReadingError::IdentityLookup(_) | ReadingError::Insert(_) | ReadingError::Fetch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, message: e.to_string() }
    }
}
