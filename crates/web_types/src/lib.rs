//! Types shared between the playground server and the browser frontend.
//!
//! Everything here compiles for wasm32 as well as the host.

use chrono::{DateTime, Utc};
use core_types::{ContentKind, Identity, Role, Snapshot, SourceBuffers};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
        }
    }
}

/// GET /api/defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsResponse {
    pub buffers: SourceBuffers,
    pub title: String,
    /// Value for the preview iframe's `sandbox` attribute
    pub sandbox: String,
}

/// POST /api/editors - A fresh editor owned by one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorOpened {
    pub editor: Uuid,
}

/// POST /api/editors/:editor/run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub buffers: SourceBuffers,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub session: SessionSummary,
    pub preview_url: String,
}

/// Identity of one sandbox session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub generation: u64,
    pub digest: String,
}

/// Where the live session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Rendering,
    Rendered,
    Failed,
}

/// One console call captured during a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: String,
    pub text: String,
}

/// What a server-side run observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub console: Vec<ConsoleEntry>,
    /// Messages shown in error banners inside the page
    pub errors: Vec<String>,
    /// Errors that escaped the page, e.g. syntax errors
    pub uncaught: Vec<String>,
}

/// GET /api/editors/:editor/session, and the payload of WebSocket state updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    #[serde(default)]
    pub session: Option<SessionSummary>,
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Present when the server executed the document itself
    #[serde(default)]
    pub report: Option<RunReport>,
    /// Why the boundary failed
    #[serde(default)]
    pub message: Option<String>,
    /// Connected WebSocket viewers
    #[serde(default)]
    pub viewers: usize,
}

impl SessionView {
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session: None,
            preview_url: None,
            report: None,
            message: None,
            viewers: 0,
        }
    }
}

/// POST /api/export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub buffers: SourceBuffers,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSnapshotRequest {
    pub buffers: SourceBuffers,
    pub title: String,
}

/// Listing entry for a saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            key: snapshot.key.clone(),
            title: snapshot.record.title.clone(),
            created_at: snapshot.created_at,
        }
    }
}

/// Query for GET /api/snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Query for GET /api/content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    #[serde(default)]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub track: Option<String>,
}

/// GET /api/me
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub identity: Identity,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Messages from the browser over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsClientMessage {
    /// Replace the buffers and run them
    Run(RunRequest),
}

/// Messages from the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsServerMessage {
    /// The live session changed
    State(SessionView),
    Error { message: String },
}
