//! REST API for the display frontend and anything else on the LAN.

pub mod server;
pub mod types;
pub mod v0;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::error::Error;
use types::ErrorResponse;

/// Adapter translating engine errors into HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::AlarmNotFound(_) | Error::OverrideNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) | Error::NotRinging => StatusCode::BAD_REQUEST,
            Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Collaborator(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
