// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON error responses for the control API.
//!
//! Every failure path, including unknown routes and malformed request
//! bodies, produces a JSON body: `{"error": "...", "code": "..."}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use waworker_core::WorkerError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// `axum::Json` with rejections rendered as [`ErrorBody`] instead of
/// axum's plain-text default.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// A failure travelling out as an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Worker(WorkerError),
    BadBody(JsonRejection),
}

impl From<WorkerError> for ApiError {
    fn from(e: WorkerError) -> Self {
        ApiError::Worker(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Worker(e) => {
                let status = match &e {
                    WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
                    WorkerError::Config(_) => StatusCode::BAD_REQUEST,
                    WorkerError::Precondition(_)
                    | WorkerError::AlreadyConnected
                    | WorkerError::NotConnected
                    | WorkerError::LoggedOut => StatusCode::CONFLICT,
                    WorkerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = ErrorBody {
                    error: e.to_string(),
                    code: e.code(),
                };
                (status, Json(body)).into_response()
            }
            // Keep axum's status split (400 syntax, 422 data) but
            // replace the plain-text body.
            ApiError::BadBody(rejection) => {
                let body = ErrorBody {
                    error: rejection.body_text(),
                    code: "bad_request",
                };
                (rejection.status(), Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_error_taxonomy() {
        let cases = [
            (WorkerError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (WorkerError::Config("bad".into()), StatusCode::BAD_REQUEST),
            (WorkerError::AlreadyConnected, StatusCode::CONFLICT),
            (WorkerError::NotConnected, StatusCode::CONFLICT),
            (
                WorkerError::Precondition("p".into()),
                StatusCode::CONFLICT,
            ),
            (
                WorkerError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            let response = ApiError::Worker(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
