//! Boundary errors.
//!
//! Requests that never reach the validator still answer in the verdict shape,
//! so clients only ever parse one body format for 4xx.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const MALFORMED_BODY: &str = "Malformed request body";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not JSON, had the wrong content type, or was too large.
    #[error("unreadable request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ApiError {
    /// 413 for an oversized body, 400 for everything else.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(rejection) => body_status(rejection.status()),
        }
    }
}

fn body_status(rejected: StatusCode) -> StatusCode {
    match rejected {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "valid": false,
            "ssn": null,
            "errors": [MALFORMED_BODY],
        });
        (self.status(), Json(body)).into_response()
    }
}
