//! Protocol-level error translation.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::adapters::auth::AuthError;
use crate::error::ControlError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    /// Path id outside the pin identifier range.
    #[error("Pin {0} not found")]
    UnknownPin(i64),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Control(ControlError::NotFound(_)) | Self::UnknownPin(_) => StatusCode::NOT_FOUND,
            Self::Control(ControlError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Control(ControlError::Driver(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });
        let mut response = (status, body).into_response();
        if matches!(self, Self::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
