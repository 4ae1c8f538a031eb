//! Page components.

mod editor;
mod learn;
mod snapshots;

pub use editor::{EditorPage, EditorSource};
pub use learn::LearnPage;
pub use snapshots::SnapshotsPage;
