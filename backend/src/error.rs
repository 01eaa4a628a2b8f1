use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::AvailabilityError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("Authentication required: {0}")]
    NotAuthenticated(String),

    #[error("User ID in request body must match URL parameter")]
    UserIdMismatch,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Availability(err) => match err {
                AvailabilityError::Interval(_) => (StatusCode::BAD_REQUEST, "invalid_intervals"),
                AvailabilityError::NoIntervals => (StatusCode::BAD_REQUEST, "no_intervals"),
                AvailabilityError::NoValidIntervals => (StatusCode::BAD_REQUEST, "no_valid_intervals"),
                AvailabilityError::TooManyBlocks { .. } => (StatusCode::BAD_REQUEST, "too_many_blocks"),
                AvailabilityError::NoUsers => (StatusCode::BAD_REQUEST, "no_users"),
                AvailabilityError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                AvailabilityError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            ApiError::NotAuthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::UserIdMismatch => (StatusCode::BAD_REQUEST, "user_id_mismatch"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "An internal server error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
