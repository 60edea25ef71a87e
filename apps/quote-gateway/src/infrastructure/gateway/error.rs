//! HTTP error mapping.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;

use crate::application::ports::{ErrorKind, MarketDataError};

/// Error body returned by every REST route.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    /// Machine-readable kind.
    pub error: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// A [`MarketDataError`] on its way to an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub MarketDataError);

impl ApiError {
    /// HTTP status for the error kind.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidParameter | ErrorKind::ClassificationAmbiguous => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::UpstreamError | ErrorKind::DivisionByZero => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<MarketDataError> for ApiError {
    fn from(error: MarketDataError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "Request failed upstream");
        }

        let body = ApiErrorResponse {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
