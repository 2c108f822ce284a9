//! HTTP API handlers for the tracker service.

/// Order placement, history and administrative updates.
pub mod orders;
/// Customer-facing tracking endpoints.
pub mod tracking;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracker_core::{OrderError, TrackingError};

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

/// API-level error carrying the HTTP status to respond with.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	code: &'static str,
	message: String,
}

impl ApiError {
	pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
		Self {
			status,
			code,
			message: message.into(),
		}
	}

	pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, code, message)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(
			self.status,
			Json(ErrorResponse {
				error: self.code.to_string(),
				message: self.message,
			}),
		)
			.into_response()
	}
}

impl From<TrackingError> for ApiError {
	fn from(e: TrackingError) -> Self {
		let (status, code) = match &e {
			TrackingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
			TrackingError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
			TrackingError::AlreadyTracked(_) => (StatusCode::CONFLICT, "ALREADY_TRACKED"),
			TrackingError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
			TrackingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
		};
		ApiError::new(status, code, e.to_string())
	}
}

impl From<OrderError> for ApiError {
	fn from(e: OrderError) -> Self {
		match e {
			OrderError::Tracking(inner) => inner.into(),
			OrderError::NotFound(_) => {
				ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
			},
			OrderError::Unauthorized => {
				ApiError::new(StatusCode::FORBIDDEN, "UNAUTHORIZED", e.to_string())
			},
			OrderError::Validation(_) => {
				ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION", e.to_string())
			},
			OrderError::Storage(_) => {
				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE", e.to_string())
			},
		}
	}
}
