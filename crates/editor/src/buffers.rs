//! The three source buffers of one editor.

use core_types::{SourceBuffers, SourceKind};

/// Holds the markup, style and script being edited.
///
/// Edits are not validated; malformed markup or style is the user's
/// business and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferManager {
    buffers: SourceBuffers,
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferManager {
    /// Start from the built-in template.
    pub fn new() -> Self {
        Self {
            buffers: SourceBuffers::defaults(),
        }
    }

    /// Start from existing buffers, e.g. a restored snapshot.
    pub fn with_buffers(buffers: SourceBuffers) -> Self {
        Self { buffers }
    }

    pub fn get(&self, kind: SourceKind) -> &str {
        self.buffers.get(kind)
    }

    pub fn set(&mut self, kind: SourceKind, text: impl Into<String>) {
        self.buffers.set(kind, text.into());
    }

    /// Restore every buffer to the built-in template. Does not re-run.
    pub fn reset(&mut self) {
        self.buffers = SourceBuffers::defaults();
    }

    /// Owned copy of the current contents.
    pub fn snapshot(&self) -> SourceBuffers {
        self.buffers.clone()
    }

    pub fn replace_all(&mut self, buffers: SourceBuffers) {
        self.buffers = buffers;
    }

    pub fn buffers(&self) -> &SourceBuffers {
        &self.buffers
    }

    /// True when nothing differs from the built-in template.
    pub fn is_pristine(&self) -> bool {
        self.buffers == SourceBuffers::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{DEFAULT_MARKUP, DEFAULT_SCRIPT, DEFAULT_STYLE};

    #[test]
    fn test_starts_from_defaults() {
        let buffers = BufferManager::new();

        assert_eq!(buffers.get(SourceKind::Markup), DEFAULT_MARKUP);
        assert_eq!(buffers.get(SourceKind::Style), DEFAULT_STYLE);
        assert_eq!(buffers.get(SourceKind::Script), DEFAULT_SCRIPT);
        assert!(buffers.is_pristine());
    }

    #[test]
    fn test_set_replaces_one_buffer() {
        let mut buffers = BufferManager::new();

        buffers.set(SourceKind::Style, "<<not css>>");

        assert_eq!(buffers.get(SourceKind::Style), "<<not css>>");
        assert_eq!(buffers.get(SourceKind::Markup), DEFAULT_MARKUP);
        assert!(!buffers.is_pristine());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut buffers = BufferManager::new();
        for kind in SourceKind::ALL {
            buffers.set(kind, "edited");
        }

        buffers.reset();
        let once = buffers.snapshot();
        buffers.reset();

        assert_eq!(buffers.snapshot(), once);
        assert_eq!(once, SourceBuffers::defaults());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffers = BufferManager::new();
        let before = buffers.snapshot();

        buffers.set(SourceKind::Script, "changed()");

        assert_eq!(before.script, DEFAULT_SCRIPT);
    }

    #[test]
    fn test_replace_all() {
        let mut buffers = BufferManager::new();

        buffers.replace_all(SourceBuffers::new("a", "b", "c"));

        assert_eq!(buffers.get(SourceKind::Markup), "a");
        assert_eq!(buffers.get(SourceKind::Style), "b");
        assert_eq!(buffers.get(SourceKind::Script), "c");
    }
}
