//! Saved snapshot routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::Snapshot;
use store::SnapshotStore;
use web_types::{SaveSnapshotRequest, SnapshotQuery, SnapshotSummary};

use super::{ApiFailure, internal, not_found};
use crate::state::AppState;

/// POST /api/snapshots - Save a project under a new key.
pub async fn save_snapshot(
    State(state): State<AppState>,
    Json(request): Json<SaveSnapshotRequest>,
) -> Result<(StatusCode, Json<SnapshotSummary>), ApiFailure> {
    let snapshot = export::save_snapshot(
        state.services.snapshots(),
        &request.buffers,
        &request.title,
    )
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(SnapshotSummary::from(&snapshot))))
}

/// GET /api/snapshots - Saved projects, newest first.
pub async fn list_snapshots(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<Vec<SnapshotSummary>>, ApiFailure> {
    let store: &dyn SnapshotStore = state.services.snapshots();
    let snapshots = store.list(query.limit).map_err(internal)?;

    Ok(Json(snapshots.iter().map(SnapshotSummary::from).collect()))
}

/// GET /api/snapshots/:key - One saved project.
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Snapshot>, ApiFailure> {
    state
        .services
        .snapshots()
        .get(&key)
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found(format!("Snapshot not found: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use core_types::SourceBuffers;

    fn request(title: &str) -> SaveSnapshotRequest {
        SaveSnapshotRequest {
            buffers: SourceBuffers::new("<p>saved</p>", "", ""),
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_list_and_get() {
        let state = test_state();

        let (status, Json(first)) = save_snapshot(State(state.clone()), Json(request("one")))
            .await
            .unwrap();
        let (_, Json(second)) = save_snapshot(State(state.clone()), Json(request("one")))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(first.key, second.key);

        let Json(listed) = list_snapshots(State(state.clone()), Query(SnapshotQuery::default()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, second.key);

        let Json(snapshot) = get_snapshot(State(state), Path(first.key.clone()))
            .await
            .unwrap();
        assert_eq!(snapshot.record.html, "<p>saved</p>");
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_404() {
        let state = test_state();

        let result = get_snapshot(State(state), Path("42".to_string())).await;

        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);
    }
}
