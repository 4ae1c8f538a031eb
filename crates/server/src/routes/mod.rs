//! API route handlers.

mod identity;
mod learning;
mod preview;
mod snapshots;
mod ws;

pub use identity::*;
pub use learning::*;
pub use preview::*;
pub use snapshots::*;
pub use ws::*;

use axum::{Json, http::StatusCode};
use web_types::ApiError;

/// Error half of every JSON handler.
pub type ApiFailure = (StatusCode, Json<ApiError>);

pub(crate) fn not_found(message: impl Into<String>) -> ApiFailure {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::with_code(message, "NOT_FOUND")),
    )
}

pub(crate) fn internal(error: impl std::fmt::Display) -> ApiFailure {
    tracing::error!(%error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::with_code(error.to_string(), "INTERNAL")),
    )
}
