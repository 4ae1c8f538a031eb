//! Identity route.

use axum::{Json, extract::State, http::HeaderMap};
use web_types::MeResponse;

use super::{ApiFailure, internal};
use crate::state::AppState;

/// Header carrying the signed-in user's uid, set by the auth front.
pub const USER_HEADER: &str = "x-user-id";

/// GET /api/me - Who is using the editor.
pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiFailure> {
    let uid = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok());

    let identity = state.services.identify(uid).map_err(internal)?;
    let role = match &identity {
        core_types::Identity::SignedIn { uid, .. } => {
            Some(state.services.role_of(uid).map_err(internal)?)
        }
        core_types::Identity::Guest => None,
    };

    Ok(Json(MeResponse { identity, role }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::http::HeaderValue;
    use core_types::{Identity, Role, UserProfile};

    #[tokio::test]
    async fn test_guest_without_header() {
        let state = test_state();

        let Json(me) = get_me(State(state), HeaderMap::new()).await.unwrap();

        assert_eq!(me.identity, Identity::Guest);
        assert!(me.role.is_none());
    }

    #[tokio::test]
    async fn test_signed_in_user() {
        let state = test_state();
        let profile = UserProfile::new("t1".into(), "Ms. Rivera".into(), "r@example.com".into());
        state.services.register(&profile, Role::Teacher).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("t1"));

        let Json(me) = get_me(State(state), headers).await.unwrap();

        assert_eq!(me.identity.display_label(), "Ms. Rivera");
        assert_eq!(me.role, Some(Role::Teacher));
    }
}
