//! Run, preview and export routes.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use core_types::SourceBuffers;
use editor::DEFAULT_TITLE;
use sandbox::SessionId;
use tracing::info;
use uuid::Uuid;
use web_types::{
    DefaultsResponse, EditorOpened, ExportRequest, RunRequest, RunResponse, SessionView,
};

use super::{ApiFailure, internal, not_found};
use crate::state::AppState;

fn unknown_editor(editor: Uuid) -> ApiFailure {
    not_found(format!("Editor not found: {editor}"))
}

/// GET /api/defaults - The starter template.
pub async fn get_defaults(
    State(state): State<AppState>,
) -> Result<Json<DefaultsResponse>, ApiFailure> {
    let policy = state.services.sandbox_policy().map_err(internal)?;

    Ok(Json(DefaultsResponse {
        buffers: SourceBuffers::defaults(),
        title: DEFAULT_TITLE.to_string(),
        sandbox: policy.iframe_attribute(),
    }))
}

/// POST /api/editors - Open an editor with its own preview session.
pub async fn open_editor(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<EditorOpened>), ApiFailure> {
    let editor = state.open_editor().await.map_err(internal)?;
    info!(%editor, "editor opened");
    Ok((StatusCode::CREATED, Json(EditorOpened { editor })))
}

/// POST /api/editors/:editor/run - Replace the buffers and start a new
/// preview session.
pub async fn run_document(
    State(state): State<AppState>,
    Path(editor): Path<Uuid>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiFailure> {
    if state.editor(editor).await.is_none() {
        return Err(unknown_editor(editor));
    }
    state
        .run(editor, request)
        .await
        .map(Json)
        .ok_or_else(|| internal("run did not start a session"))
}

/// GET /api/editors/:editor/session - The editor's live session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(editor): Path<Uuid>,
) -> Result<Json<SessionView>, ApiFailure> {
    let shared = state.editor(editor).await.ok_or_else(|| unknown_editor(editor))?;
    let current = shared.lock().await.controller().state();
    Ok(Json(state.session_view(editor, &current).await))
}

/// GET /preview/:editor/:session - The document of an editor's live session.
///
/// Served under a CSP `sandbox` so the browser isolates it even when opened
/// directly. Replaced sessions are gone.
pub async fn get_preview(
    State(state): State<AppState>,
    Path((editor, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Response {
    let Some(shared) = state.editor(editor).await else {
        return unknown_editor(editor).into_response();
    };
    let editor = shared.lock().await;
    let Some(document) = editor.document_for(SessionId::from(id)) else {
        return not_found(format!("Preview session not found: {id}")).into_response();
    };

    let etag = format!("\"{}\"", document.digest());
    let fresh = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);
    if fresh {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_SECURITY_POLICY,
                editor.controller().policy().csp_header(),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (header::ETAG, etag),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::REFERRER_POLICY, "no-referrer".to_string()),
        ],
        document.as_str().to_string(),
    )
        .into_response()
}

/// POST /api/export - Download the posted buffers as a standalone HTML file.
///
/// Touches no editor.
pub async fn export_document(Json(request): Json<ExportRequest>) -> Response {
    let title = request.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let artifact = export::export_buffers(&request.buffers, title);
    info!(filename = %artifact.filename, bytes = artifact.len(), "serving export");

    (
        [
            (header::CONTENT_TYPE, artifact.content_type().to_string()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.content,
    )
        .into_response()
}
