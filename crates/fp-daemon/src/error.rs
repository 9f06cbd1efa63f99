use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fp_orders::{AmountError, OrderRejection, ProfileRejection, UpdateRefusal};
use thiserror::Error;

use crate::api_types::ErrorResponse;

/// Every handler failure. Rendered as JSON `{ "error": "..." }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("database not configured")]
    DbUnavailable,

    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DbUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Domain refusals raised inside a DB closure surface as 403, everything
/// else as 500.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(refusal) = err.downcast_ref::<UpdateRefusal>() {
            return ApiError::Forbidden(refusal.to_string());
        }
        ApiError::Internal(err)
    }
}

impl From<OrderRejection> for ApiError {
    fn from(r: OrderRejection) -> Self {
        ApiError::BadRequest(r.to_string())
    }
}

impl From<AmountError> for ApiError {
    fn from(e: AmountError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ProfileRejection> for ApiError {
    fn from(r: ProfileRejection) -> Self {
        ApiError::BadRequest(r.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(err) = &self {
            tracing::error!(error = %format!("{err:#}"), "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
