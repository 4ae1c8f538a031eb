//! Learning content routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use content::ContentProvider;
use core_types::ContentItem;
use web_types::ContentFilter;

use super::{ApiFailure, not_found};
use crate::state::AppState;

/// GET /api/content - Achievements, challenges and curricula.
pub async fn list_content(
    State(state): State<AppState>,
    Query(filter): Query<ContentFilter>,
) -> Json<Vec<ContentItem>> {
    let provider: &dyn ContentProvider = state.services.content();
    let items = provider
        .filter(filter.kind, filter.track.as_deref())
        .into_iter()
        .cloned()
        .collect();

    Json(items)
}

/// GET /api/content/:id - One content item.
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContentItem>, ApiFailure> {
    state
        .services
        .content()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Content not found: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::http::StatusCode;
    use core_types::ContentKind;

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let state = test_state();
        let filter = ContentFilter {
            kind: Some(ContentKind::Achievement),
            track: None,
        };

        let Json(items) = list_content(State(state), Query(filter)).await;

        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.kind == ContentKind::Achievement));
    }

    #[tokio::test]
    async fn test_get_content() {
        let state = test_state();

        let Json(item) = get_content(State(state.clone()), Path("cur_web_basics".to_string()))
            .await
            .unwrap();
        assert_eq!(item.kind, ContentKind::Curriculum);

        let missing = get_content(State(state), Path("nope".to_string())).await;
        assert_eq!(missing.unwrap_err().0, StatusCode::NOT_FOUND);
    }
}
