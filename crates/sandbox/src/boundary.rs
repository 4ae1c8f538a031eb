//! The untrusted code execution boundary.

use assembler::AssembledDocument;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::headless::HeadlessReport;
use crate::{Result, SandboxPolicy};

/// Identifier of one sandbox session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The rendering context bound to one assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSession {
    pub id: SessionId,
    /// Run counter of the owning controller; later runs have larger values
    pub generation: u64,
    /// Digest of the document loaded into this session
    pub digest: String,
}

/// What a boundary produced for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RenderedOutput {
    /// Embed markup for a sandboxed iframe; the browser does the rendering
    Frame { embed: String },
    /// Result of executing the document's scripts in a headless engine
    Headless(HeadlessReport),
}

/// An isolated context that can load and execute a preview document.
///
/// Implementations must start from a clean slate on every call: no globals
/// or DOM state may survive from a previous document. Script errors inside
/// the document are part of the output, never an `Err`.
pub trait ExecutionBoundary: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Load `document` into a fresh context governed by `policy`.
    fn load(
        &self,
        session: &SandboxSession,
        document: &AssembledDocument,
        policy: &SandboxPolicy,
    ) -> Result<RenderedOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();

        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn test_session_id_serializes_as_plain_uuid() {
        let id = SessionId::new();

        let json = serde_json::to_string(&id).unwrap();

        assert_eq!(json, format!("\"{id}\""));
    }
}
