//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Body of `POST /api/v1/ssn/validate`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub ssn: Option<String>,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

/// Sanitize, validate, render. 200 for a valid SSN, 400 otherwise.
pub async fn validate_ssn(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = ApiError::from(rejection);
            tracing::debug!(error = %error, "Rejected request body");
            return error.into_response();
        }
    };

    let cleaned = request.ssn.as_deref().map(|raw| state.sanitizer.clean(raw));
    let verdict = state.validator.validate_opt(cleaned.as_deref());
    metrics::record_validation(verdict.is_valid());

    let status = if verdict.is_valid() {
        StatusCode::OK
    } else {
        tracing::debug!(violations = ?verdict.errors(), "SSN failed validation");
        StatusCode::BAD_REQUEST
    };

    (status, Json(verdict)).into_response()
}
