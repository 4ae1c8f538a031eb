//! Owner of the single live sandbox session.

use assembler::AssembledDocument;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::boundary::{ExecutionBoundary, RenderedOutput, SandboxSession, SessionId};
use crate::{Result, SandboxError, SandboxPolicy};

/// A session together with what its boundary produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSession {
    pub session: SandboxSession,
    pub output: RenderedOutput,
}

/// Observable state of the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Nothing has been run yet
    #[default]
    Idle,
    /// A document was handed to the boundary and is executing
    Rendering { session: SandboxSession },
    /// The current session finished loading
    Rendered(Arc<RenderedSession>),
    /// The boundary itself broke; user script errors never land here
    Failed {
        session: SandboxSession,
        message: String,
    },
}

impl SessionState {
    /// The session this state belongs to, if any.
    pub fn session(&self) -> Option<&SandboxSession> {
        match self {
            SessionState::Idle => None,
            SessionState::Rendering { session } | SessionState::Failed { session, .. } => {
                Some(session)
            }
            SessionState::Rendered(rendered) => Some(&rendered.session),
        }
    }

    /// Short phase name for logs and APIs.
    pub fn phase(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Rendering { .. } => "rendering",
            SessionState::Rendered(_) => "rendered",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// Runs documents through an execution boundary, one session at a time.
///
/// `run` returns as soon as the document is handed off. Each run bumps the
/// generation and replaces the current session; a result that arrives for
/// an older generation is dropped.
pub struct SandboxController {
    boundary: Arc<dyn ExecutionBoundary>,
    policy: SandboxPolicy,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SessionState>>,
    runtime: Handle,
}

impl SandboxController {
    /// Create a controller on the current tokio runtime.
    pub fn new(boundary: Arc<dyn ExecutionBoundary>, policy: SandboxPolicy) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SandboxError::NoRuntime)?;
        let (state, _) = watch::channel(SessionState::Idle);

        Ok(Self {
            boundary,
            policy,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            runtime,
        })
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn boundary_name(&self) -> &'static str {
        self.boundary.name()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The live session, if any run has started.
    pub fn current_session(&self) -> Option<SandboxSession> {
        self.state.borrow().session().cloned()
    }

    /// Load a document into a fresh session, replacing the current one.
    pub fn run(&self, document: AssembledDocument) -> SessionId {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = SandboxSession {
            id: SessionId::new(),
            generation,
            digest: document.digest().to_string(),
        };
        let id = session.id;

        self.state.send_replace(SessionState::Rendering {
            session: session.clone(),
        });
        info!(
            session = %id,
            generation,
            boundary = self.boundary.name(),
            bytes = document.len(),
            "sandbox run started"
        );

        let boundary = Arc::clone(&self.boundary);
        let policy = self.policy.clone();
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let blocking = self.runtime.clone();

        self.runtime.spawn(async move {
            let loading = session.clone();
            let outcome = blocking
                .spawn_blocking(move || boundary.load(&loading, &document, &policy))
                .await;

            let next = match outcome {
                Ok(Ok(output)) => SessionState::Rendered(Arc::new(RenderedSession {
                    session: session.clone(),
                    output,
                })),
                Ok(Err(e)) => SessionState::Failed {
                    session: session.clone(),
                    message: e.to_string(),
                },
                Err(e) => SessionState::Failed {
                    session: session.clone(),
                    message: format!("boundary task aborted: {e}"),
                },
            };

            let published = state.send_if_modified(|slot| {
                if current.load(Ordering::SeqCst) == generation {
                    *slot = next;
                    true
                } else {
                    false
                }
            });

            if published {
                debug!(session = %session.id, generation, "sandbox run published");
            } else {
                debug!(session = %session.id, generation, "discarded superseded run");
            }
        });

        id
    }

    /// Wait until the given session finishes loading.
    ///
    /// Fails with [`SandboxError::Superseded`] once a newer run has
    /// replaced it.
    pub async fn wait_for(&self, id: SessionId) -> Result<Arc<RenderedSession>> {
        let mut receiver = self.state.subscribe();
        loop {
            let outcome = {
                let state = receiver.borrow_and_update();
                match &*state {
                    SessionState::Rendered(rendered) if rendered.session.id == id => {
                        Some(Ok(Arc::clone(rendered)))
                    }
                    SessionState::Failed { session, message } if session.id == id => {
                        warn!(session = %id, %message, "sandbox boundary failed");
                        Some(Err(SandboxError::Boundary(message.clone())))
                    }
                    SessionState::Rendering { session } if session.id == id => None,
                    _ => Some(Err(SandboxError::Superseded(id))),
                }
            };

            if let Some(result) = outcome {
                return result;
            }
            receiver
                .changed()
                .await
                .map_err(|_| SandboxError::Closed)?;
        }
    }
}
