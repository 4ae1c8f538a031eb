//! Conversions from sandbox state to API views.

use sandbox::{HeadlessReport, RenderedOutput, SandboxSession, SessionId, SessionState};
use uuid::Uuid;
use web_types::{ConsoleEntry, RunReport, SessionPhase, SessionSummary, SessionView};

/// Path the preview document of an editor's session is served from.
pub fn preview_url(editor: Uuid, session: SessionId) -> String {
    format!("/preview/{editor}/{session}")
}

pub fn summary(session: &SandboxSession) -> SessionSummary {
    SessionSummary {
        id: session.id.as_uuid(),
        generation: session.generation,
        digest: session.digest.clone(),
    }
}

pub fn run_report(report: &HeadlessReport) -> RunReport {
    RunReport {
        console: report
            .console
            .iter()
            .map(|line| ConsoleEntry {
                level: line.level.clone(),
                text: line.text.clone(),
            })
            .collect(),
        errors: report
            .error_banners()
            .into_iter()
            .map(str::to_string)
            .collect(),
        uncaught: report.uncaught.clone(),
    }
}

pub fn session_view(editor: Uuid, state: &SessionState, viewers: usize) -> SessionView {
    let mut view = SessionView {
        viewers,
        ..SessionView::idle()
    };

    match state {
        SessionState::Idle => {}
        SessionState::Rendering { session } => {
            view.phase = SessionPhase::Rendering;
            view.session = Some(summary(session));
            view.preview_url = Some(preview_url(editor, session.id));
        }
        SessionState::Rendered(rendered) => {
            view.phase = SessionPhase::Rendered;
            view.session = Some(summary(&rendered.session));
            view.preview_url = Some(preview_url(editor, rendered.session.id));
            if let RenderedOutput::Headless(report) = &rendered.output {
                view.report = Some(run_report(report));
            }
        }
        SessionState::Failed { session, message } => {
            view.phase = SessionPhase::Failed;
            view.session = Some(summary(session));
            view.message = Some(message.clone());
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox::{AppendedNode, ConsoleLine, RenderedSession};
    use std::sync::Arc;

    fn session() -> SandboxSession {
        SandboxSession {
            id: SessionId::new(),
            generation: 3,
            digest: "abc".to_string(),
        }
    }

    #[test]
    fn test_idle_view() {
        let view = session_view(Uuid::new_v4(), &SessionState::Idle, 2);

        assert_eq!(view.phase, SessionPhase::Idle);
        assert!(view.session.is_none());
        assert_eq!(view.viewers, 2);
    }

    #[test]
    fn test_rendered_headless_view_carries_report() {
        let session = session();
        let report = HeadlessReport {
            scripts_executed: 1,
            console: vec![ConsoleLine {
                level: "log".to_string(),
                text: "hi".to_string(),
            }],
            appended: vec![AppendedNode {
                tag: "div".to_string(),
                class_name: "sandbox-error".to_string(),
                text: "Error: x".to_string(),
            }],
            ..HeadlessReport::default()
        };
        let state = SessionState::Rendered(Arc::new(RenderedSession {
            session: session.clone(),
            output: RenderedOutput::Headless(report),
        }));

        let editor = Uuid::new_v4();
        let view = session_view(editor, &state, 0);

        assert_eq!(view.phase, SessionPhase::Rendered);
        assert_eq!(
            view.preview_url,
            Some(format!("/preview/{editor}/{}", session.id))
        );
        let report = view.report.unwrap();
        assert_eq!(report.errors, vec!["Error: x"]);
        assert_eq!(report.console[0].text, "hi");
    }

    #[test]
    fn test_failed_view_has_message_but_no_preview() {
        let state = SessionState::Failed {
            session: session(),
            message: "engine down".to_string(),
        };

        let view = session_view(Uuid::new_v4(), &state, 0);

        assert_eq!(view.phase, SessionPhase::Failed);
        assert_eq!(view.message.as_deref(), Some("engine down"));
        assert!(view.preview_url.is_none());
        assert_eq!(view.session.unwrap().generation, 3);
    }
}
