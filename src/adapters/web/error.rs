//! HTTP error responses for web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::TrendstopError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_from_error(err: &TrendstopError) -> StatusCode {
    match err {
        TrendstopError::InvalidAssetId(_)
        | TrendstopError::UnknownSource(_)
        | TrendstopError::UnsupportedResolution { .. } => StatusCode::BAD_REQUEST,
        TrendstopError::EmptySeries | TrendstopError::InsufficientHistory { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TrendstopError::Feed { .. }
        | TrendstopError::MalformedBar { .. }
        | TrendstopError::DuplicateTimestamp { .. } => StatusCode::BAD_GATEWAY,
        TrendstopError::ConfigParse { .. }
        | TrendstopError::ConfigMissing { .. }
        | TrendstopError::ConfigInvalid { .. }
        | TrendstopError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TrendstopError> for WebError {
    fn from(err: TrendstopError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
