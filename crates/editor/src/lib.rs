//! The live-preview editor.
//!
//! This crate provides:
//! - BufferManager: the markup, style and script buffers
//! - EditorSession: buffers plus the sandbox controller, export and save

pub mod buffers;
pub mod session;

pub use buffers::BufferManager;
pub use session::{DEFAULT_TITLE, EditorSession};

use thiserror::Error;

/// Errors from editor operations.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] sandbox::SandboxError),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
