//! Static learning content for the Hello World playground.
//!
//! Achievements, challenges and curricula are plain data. They ship as a
//! JSON seed file compiled into the crate, and can be replaced by a file
//! named in the configuration.

use core_types::{ContentItem, ContentKind};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const BUILTIN_SEED: &str = include_str!("../seed/content.json");

/// Errors from content operations.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate content id: {0}")]
    DuplicateId(String),
}

/// Result type for content operations.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Source of achievements, challenges and curricula.
pub trait ContentProvider: Send + Sync {
    /// Every item, in seed order.
    fn items(&self) -> &[ContentItem];

    /// Get an item by ID.
    fn get(&self, id: &str) -> Option<&ContentItem> {
        self.items().iter().find(|item| item.id == id)
    }

    /// Items matching an optional kind and an optional track.
    fn filter(&self, kind: Option<ContentKind>, track: Option<&str>) -> Vec<&ContentItem> {
        self.items()
            .iter()
            .filter(|item| kind.is_none_or(|k| item.kind == k))
            .filter(|item| track.is_none_or(|t| item.track.eq_ignore_ascii_case(t)))
            .collect()
    }

    /// Distinct tracks, in first-seen order.
    fn tracks(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items()
            .iter()
            .map(|item| item.track.as_str())
            .filter(|track| seen.insert(*track))
            .collect()
    }
}

/// Content held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticContentProvider {
    items: Vec<ContentItem>,
}

impl StaticContentProvider {
    /// Build a provider, rejecting duplicate ids.
    pub fn new(items: Vec<ContentItem>) -> Result<Self> {
        let mut ids = HashSet::new();
        for item in &items {
            if !ids.insert(item.id.as_str()) {
                return Err(ContentError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// The seed compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SEED)
    }

    /// Load content from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Load content from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let provider = Self::from_json(&content)?;
        debug!(path = %path.display(), items = provider.items.len(), "loaded content");
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ContentProvider for StaticContentProvider {
    fn items(&self) -> &[ContentItem] {
        &self.items
    }
}
