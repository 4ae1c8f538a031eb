//! Reusable UI components.

mod loading;
mod preview_frame;
mod source_pane;

pub use loading::Loading;
pub use preview_frame::PreviewFrame;
pub use source_pane::SourcePane;
