//! Application state for the web server.

use chrono::{DateTime, Utc};
use editor::EditorSession;
use sandbox::SessionState;
use services::ExternalServices;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;
use web_types::{RunRequest, RunResponse, SessionSummary, SessionView};

use crate::views;

/// One client's editor and its single preview session.
pub type SharedEditor = Arc<Mutex<EditorSession>>;

struct OpenEditor {
    session: SharedEditor,
    opened_at: DateTime<Utc>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: ExternalServices,
    /// Editors by id, one per browser tab or WebSocket client
    editors: Arc<RwLock<HashMap<Uuid, OpenEditor>>>,
    /// Connected WebSocket viewers.
    pub viewers: Arc<RwLock<HashMap<Uuid, Viewer>>>,
}

/// A connected WebSocket client.
pub struct Viewer {
    pub editor: Uuid,
    pub connected_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(services: ExternalServices) -> Self {
        Self {
            services,
            editors: Arc::new(RwLock::new(HashMap::new())),
            viewers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open a new editor; must be called inside the tokio runtime.
    ///
    /// Closes the oldest editor once `max_editors` are open.
    pub async fn open_editor(&self) -> anyhow::Result<Uuid> {
        let session = EditorSession::new(
            self.services.execution_boundary(),
            self.services.sandbox_policy()?,
        )?;
        let id = Uuid::new_v4();
        let limit = self.services.config().server.max_editors.max(1);

        let mut editors = self.editors.write().await;
        while editors.len() >= limit {
            let Some(oldest) = editors
                .iter()
                .min_by_key(|(_, open)| open.opened_at)
                .map(|(id, _)| *id)
            else {
                break;
            };
            editors.remove(&oldest);
            info!(editor = %oldest, "closed oldest editor");
        }
        editors.insert(
            id,
            OpenEditor {
                session: Arc::new(Mutex::new(session)),
                opened_at: Utc::now(),
            },
        );
        debug!(editor = %id, open = editors.len(), "editor opened");
        Ok(id)
    }

    pub async fn editor(&self, id: Uuid) -> Option<SharedEditor> {
        self.editors
            .read()
            .await
            .get(&id)
            .map(|open| Arc::clone(&open.session))
    }

    pub async fn editor_count(&self) -> usize {
        self.editors.read().await.len()
    }

    /// Load the request's buffers into one editor and run them.
    ///
    /// `None` when the editor does not exist.
    pub async fn run(&self, editor_id: Uuid, request: RunRequest) -> Option<RunResponse> {
        let shared = self.editor(editor_id).await?;
        let mut editor = shared.lock().await;
        editor.load(request.buffers);
        if let Some(title) = request.title {
            editor.set_title(title);
        }

        let id = editor.run();
        let session = editor.controller().current_session().filter(|s| s.id == id)?;

        Some(RunResponse {
            preview_url: views::preview_url(editor_id, id),
            session: SessionSummary {
                id: id.as_uuid(),
                generation: session.generation,
                digest: session.digest,
            },
        })
    }

    /// Describe a controller state for API clients.
    pub async fn session_view(&self, editor: Uuid, state: &SessionState) -> SessionView {
        views::session_view(editor, state, self.viewer_count(editor).await)
    }

    /// Register a viewer of one editor.
    pub async fn add_viewer(&self, editor: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.viewers.write().await.insert(
            id,
            Viewer {
                editor,
                connected_at: Utc::now(),
            },
        );
        id
    }

    pub async fn remove_viewer(&self, id: Uuid) {
        if let Some(viewer) = self.viewers.write().await.remove(&id) {
            let seconds = (Utc::now() - viewer.connected_at).num_seconds();
            debug!(viewer = %id, editor = %viewer.editor, seconds, "viewer disconnected");
        }
    }

    /// Viewers watching one editor.
    pub async fn viewer_count(&self, editor: Uuid) -> usize {
        self.viewers
            .read()
            .await
            .values()
            .filter(|viewer| viewer.editor == editor)
            .count()
    }
}

/// In-memory state for handler tests.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    test_state_with(services::ServicesConfig::default())
}

#[cfg(test)]
pub(crate) fn test_state_with(config: services::ServicesConfig) -> AppState {
    AppState::new(ExternalServices::in_memory(config).unwrap())
}
