//! Browser isolation through a sandboxed iframe.

use assembler::{AssembledDocument, escape_html};
use tracing::debug;

use crate::boundary::{ExecutionBoundary, RenderedOutput, SandboxSession};
use crate::{Result, SandboxPolicy};

/// Boundary that hands the document to the browser inside an iframe.
///
/// The document travels in `srcdoc`, so the frame gets an opaque origin;
/// the `sandbox` attribute carries the policy. Every session gets its own
/// `data-session` value so a host re-mounts a fresh frame per run.
#[derive(Debug, Clone, Default)]
pub struct FrameBoundary {
    title: Option<String>,
}

impl FrameBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessible title for the iframe element.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Build the iframe element for a document.
    pub fn embed(
        &self,
        session: &SandboxSession,
        document: &AssembledDocument,
        policy: &SandboxPolicy,
    ) -> String {
        let title = self.title.as_deref().unwrap_or("Preview");
        format!(
            r#"<iframe title="{}" sandbox="{}" referrerpolicy="no-referrer" data-session="{}" srcdoc="{}"></iframe>"#,
            escape_html(title),
            policy.iframe_attribute(),
            session.id,
            escape_html(document.as_str()),
        )
    }
}

impl ExecutionBoundary for FrameBoundary {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn load(
        &self,
        session: &SandboxSession,
        document: &AssembledDocument,
        policy: &SandboxPolicy,
    ) -> Result<RenderedOutput> {
        let embed = self.embed(session, document, policy);
        debug!(session = %session.id, bytes = embed.len(), "built iframe embed");
        Ok(RenderedOutput::Frame { embed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::SessionId;
    use assembler::assemble;

    fn session_for(document: &AssembledDocument) -> SandboxSession {
        SandboxSession {
            id: SessionId::new(),
            generation: 1,
            digest: document.digest().to_string(),
        }
    }

    #[test]
    fn test_embed_carries_policy_and_escaped_document() {
        let document = assemble("<p class=\"x\">Hi & bye</p>", "", "");
        let session = session_for(&document);

        let embed = FrameBoundary::new().embed(&session, &document, &SandboxPolicy::default());

        assert!(embed.starts_with("<iframe "));
        assert!(embed.contains(r#"sandbox="allow-scripts""#));
        assert!(embed.contains(r#"referrerpolicy="no-referrer""#));
        assert!(embed.contains(&format!(r#"data-session="{}""#, session.id)));
        assert!(embed.contains("&lt;p class=&quot;x&quot;&gt;Hi &amp; bye&lt;/p&gt;"));
        assert!(!embed.contains("allow-same-origin"));
    }

    #[test]
    fn test_load_returns_frame_output() {
        let document = assemble("", "", "");
        let session = session_for(&document);

        let output = FrameBoundary::new()
            .with_title("Your page")
            .load(&session, &document, &SandboxPolicy::default())
            .unwrap();

        match output {
            RenderedOutput::Frame { embed } => assert!(embed.contains(r#"title="Your page""#)),
            other => panic!("Expected frame output, got {other:?}"),
        }
    }
}
