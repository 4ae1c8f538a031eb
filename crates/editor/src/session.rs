//! One live editor: buffers, the preview sandbox and the save/download
//! actions.

use assembler::AssembledDocument;
use core_types::{Snapshot, SourceBuffers, SourceKind};
use export::ExportArtifact;
use sandbox::{ExecutionBoundary, SandboxController, SandboxPolicy, SessionId};
use std::sync::Arc;
use store::SnapshotStore;
use tracing::{info, info_span};

use crate::{BufferManager, Result};

/// Title used before the user names the project.
pub const DEFAULT_TITLE: &str = "Hello World";

/// The document behind the live session.
#[derive(Debug, Clone)]
struct LastRun {
    session: SessionId,
    document: AssembledDocument,
}

/// A single editor instance.
///
/// Owns the buffers and exactly one sandbox controller. Running assembles
/// the buffers as they are at that moment and replaces the previous
/// preview.
pub struct EditorSession {
    buffers: BufferManager,
    title: String,
    controller: SandboxController,
    last_run: Option<LastRun>,
}

impl EditorSession {
    /// Create an editor on the current tokio runtime.
    pub fn new(boundary: Arc<dyn ExecutionBoundary>, policy: SandboxPolicy) -> Result<Self> {
        Ok(Self {
            buffers: BufferManager::new(),
            title: DEFAULT_TITLE.to_string(),
            controller: SandboxController::new(boundary, policy)?,
            last_run: None,
        })
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    pub fn get(&self, kind: SourceKind) -> &str {
        self.buffers.get(kind)
    }

    pub fn set(&mut self, kind: SourceKind, text: impl Into<String>) {
        self.buffers.set(kind, text);
    }

    /// Put every buffer back to the template. The preview is left alone.
    pub fn reset(&mut self) {
        self.buffers.reset();
    }

    /// Replace all three buffers at once.
    pub fn load(&mut self, buffers: SourceBuffers) {
        self.buffers.replace_all(buffers);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn controller(&self) -> &SandboxController {
        &self.controller
    }

    /// Assemble the current buffers and hand them to the sandbox.
    ///
    /// Returns as soon as the document is handed off.
    pub fn run(&mut self) -> SessionId {
        let _span = info_span!("run", title = %self.title).entered();

        let document = AssembledDocument::from_buffers(self.buffers.buffers());
        let session = self.controller.run(document.clone());
        self.last_run = Some(LastRun { session, document });
        session
    }

    /// Document of the most recent run.
    pub fn last_document(&self) -> Option<&AssembledDocument> {
        self.last_run.as_ref().map(|run| &run.document)
    }

    /// The live session's id, if anything has run.
    pub fn current_session(&self) -> Option<SessionId> {
        self.last_run.as_ref().map(|run| run.session)
    }

    /// Document for `session`, only while it is still the live one.
    pub fn document_for(&self, session: SessionId) -> Option<&AssembledDocument> {
        self.last_run
            .as_ref()
            .filter(|run| run.session == session)
            .map(|run| &run.document)
    }

    /// Download of the buffers as they are right now.
    pub fn export_artifact(&self) -> ExportArtifact {
        let artifact = export::export_buffers(self.buffers.buffers(), &self.title);
        info!(filename = %artifact.filename, bytes = artifact.len(), "exported project");
        artifact
    }

    /// Save the current buffers under a new key.
    pub fn save_snapshot(&self, store: &dyn SnapshotStore) -> Result<Snapshot> {
        Ok(export::save_snapshot(
            store,
            self.buffers.buffers(),
            &self.title,
        )?)
    }

    /// Load a saved snapshot into the buffers and take over its title.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.buffers.replace_all(snapshot.record.to_buffers());
        self.title = snapshot.record.title.clone();
        info!(key = %snapshot.key, "restored snapshot");
    }
}
