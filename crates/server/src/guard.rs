//! Cross-origin rules for the API and the live-session socket.
//!
//! Preview documents run with an opaque origin, so anything they send
//! carries `Origin: null`. Those requests, and requests from pages on other
//! sites, must never reach the editors.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};
use web_types::ApiError;

use crate::routes::ApiFailure;
use crate::state::AppState;

/// Origin sandboxed documents report.
const OPAQUE_ORIGIN: &str = "null";

/// Whether a request may act on the API.
///
/// Requests without an `Origin` header come from the same page or from
/// non-browser clients. Otherwise the origin must be configured or match
/// the host the request was sent to.
pub fn origin_allowed(origin: Option<&str>, host: Option<&str>, allowed: &[String]) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    if origin == OPAQUE_ORIGIN {
        return false;
    }
    if allowed.iter().any(|entry| entry == origin) {
        return true;
    }

    host.is_some_and(|host| {
        origin
            .strip_prefix("http://")
            .or_else(|| origin.strip_prefix("https://"))
            .is_some_and(|authority| authority.eq_ignore_ascii_case(host))
    })
}

/// Check one request's headers.
pub fn check_origin(headers: &HeaderMap, allowed: &[String]) -> Result<(), ApiFailure> {
    let origin = headers.get(header::ORIGIN).map(HeaderValue::to_str);
    let origin = match origin {
        None => None,
        Some(Ok(origin)) => Some(origin),
        Some(Err(_)) => return Err(forbidden("<unreadable>")),
    };
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    if origin_allowed(origin, host, allowed) {
        Ok(())
    } else {
        Err(forbidden(origin.unwrap_or_default()))
    }
}

fn forbidden(origin: &str) -> ApiFailure {
    warn!(%origin, "rejected cross-origin request");
    (
        StatusCode::FORBIDDEN,
        Json(ApiError::with_code(
            format!("Origin not allowed: {origin}"),
            "FORBIDDEN_ORIGIN",
        )),
    )
}

/// Middleware rejecting requests from foreign or opaque origins.
pub async fn guard_origin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let allowed = &state.services.config().server.allowed_origins;
    match check_origin(request.headers(), allowed) {
        Ok(()) => next.run(request).await,
        Err(failure) => failure.into_response(),
    }
}

/// CORS for the configured origins only; `None` when no origin is listed.
///
/// `null` and `*` entries are dropped.
pub fn cors_layer(allowed: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter(|origin| !matches!(origin.as_str(), OPAQUE_ORIGIN | "*"))
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring malformed allowed origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        debug!("no cross-origin clients configured");
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}
