//! Error to HTTP response mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::Error;

/// Errors returned by the HTTP handlers, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed validation (422)
    Validation(String),
    /// Caller input rejected by the agent (400)
    BadRequest(String),
    /// Agent could not be constructed at startup (500)
    Unavailable(String),
    /// Anything that failed while answering (500)
    Service(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) | ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Validation(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Unavailable(reason) => {
                format!("Agent service is unavailable: {}", reason)
            }
            ApiError::Service(cause) => format!("LLM service error: {}", cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.detail() }));
        (self.status(), body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Service(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
