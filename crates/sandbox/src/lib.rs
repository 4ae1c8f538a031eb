//! Sandboxed execution of assembled preview documents.
//!
//! This crate provides:
//! - SandboxPolicy: which capabilities executed script is granted
//! - ExecutionBoundary: the untrusted-code boundary, with an iframe
//!   implementation for browsers and a headless script-engine one
//! - SandboxController: owns the single live session and replaces it
//!   wholesale on every run

mod boundary;
mod controller;
mod frame;
mod headless;
mod policy;

pub use boundary::{ExecutionBoundary, RenderedOutput, SandboxSession, SessionId};
pub use controller::{RenderedSession, SandboxController, SessionState};
pub use frame::FrameBoundary;
pub use headless::{AppendedNode, ConsoleLine, HeadlessBoundary, HeadlessConfig, HeadlessReport};
pub use policy::{Capability, SandboxPolicy};

use thiserror::Error;

/// Errors from sandbox operations.
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Capability {0} is never granted to preview documents")]
    ForbiddenCapability(Capability),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Script engine error: {0}")]
    Engine(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No async runtime available")]
    NoRuntime,

    #[error("Session {0} was replaced by a newer run")]
    Superseded(SessionId),

    #[error("Sandbox boundary failed: {0}")]
    Boundary(String),

    #[error("Sandbox controller closed")]
    Closed,
}

/// Result type for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
