//! Export and persistence of playground projects.
//!
//! Projects leave the editor two ways: as a standalone `.html` download, or
//! as a keyed snapshot record in a [`SnapshotStore`]. Both only happen on
//! an explicit user action.

use chrono::{DateTime, Utc};
use core_types::{Snapshot, SnapshotRecord, SourceBuffers};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use store::SnapshotStore;
use thiserror::Error;
use tracing::info;

/// Extension of every downloaded file.
pub const EXPORT_EXTENSION: &str = "html";

/// Stem used when a title has nothing usable in it.
pub const UNTITLED: &str = "untitled";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("Invalid dash regex"));

/// Errors from export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// A named, self-contained document ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// MIME type of the download.
    pub fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    /// `Content-Disposition` value that makes a browser save the file.
    ///
    /// Non-ASCII names get an ASCII `filename` fallback plus the RFC 5987
    /// `filename*` form carrying the real name.
    pub fn content_disposition(&self) -> String {
        if self.filename.is_ascii() {
            return format!("attachment; filename=\"{}\"", self.filename);
        }

        let fallback: String = self
            .filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_ext_value(&self.filename)
        )
    }

    /// Write the artifact into `dir` under its own filename.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf> {
        if dir.exists() && !dir.is_dir() {
            return Err(ExportError::NotADirectory(dir.to_path_buf()));
        }
        fs::create_dir_all(dir)?;

        let path = dir.join(&self.filename);
        fs::write(&path, &self.content)?;
        info!(path = %path.display(), bytes = self.len(), "wrote export");
        Ok(path)
    }
}

/// Percent-encode everything outside RFC 5987 `attr-char`.
fn encode_ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

/// Turn a project title into a safe download filename.
///
/// Lower-cases, replaces whitespace runs with `-`, drops everything that
/// is not a letter, digit, `-` or `_`, and collapses repeated dashes.
pub fn export_filename(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let dashed = WHITESPACE_RUN.replace_all(&lowered, "-");
    let kept: String = dashed
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let collapsed = DASH_RUN.replace_all(&kept, "-");
    let stem = collapsed.trim_matches('-');

    if stem.is_empty() {
        format!("{UNTITLED}.{EXPORT_EXTENSION}")
    } else {
        format!("{stem}.{EXPORT_EXTENSION}")
    }
}

/// Package document text as a download named after `title`.
pub fn to_downloadable_artifact(document_text: &str, title: &str) -> ExportArtifact {
    ExportArtifact {
        filename: export_filename(title),
        content: document_text.to_string(),
        created_at: Utc::now(),
    }
}

/// Build the clean export document from the given buffers and package it.
///
/// The downloaded file carries the raw script, with no error harness.
pub fn export_buffers(buffers: &SourceBuffers, title: &str) -> ExportArtifact {
    let document =
        assembler::assemble_export(&buffers.markup, &buffers.style, &buffers.script, title);
    to_downloadable_artifact(&document, title)
}

/// Save the buffers under a new timestamp-derived key.
pub fn save_snapshot(
    store: &dyn SnapshotStore,
    buffers: &SourceBuffers,
    title: &str,
) -> Result<Snapshot> {
    let record = SnapshotRecord::from_buffers(buffers, title);
    Ok(store.save(&record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemorySnapshotStore;
    use tempfile::tempdir;

    #[test]
    fn test_filename_from_mixed_title() {
        assert_eq!(export_filename("My Cool Project!"), "my-cool-project.html");
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(export_filename("  Hello   World  "), "hello-world.html");
        assert_eq!(export_filename("Tabs\tand\nnewlines"), "tabs-and-newlines.html");
        assert_eq!(export_filename("a - b"), "a-b.html");
        assert_eq!(export_filename("../../etc/passwd"), "etcpasswd.html");
        assert_eq!(export_filename("snake_case OK"), "snake_case-ok.html");
        assert_eq!(export_filename("Ünïcode Café"), "ünïcode-café.html");
    }

    #[test]
    fn test_filename_falls_back_when_empty() {
        assert_eq!(export_filename(""), "untitled.html");
        assert_eq!(export_filename("!!!"), "untitled.html");
        assert_eq!(export_filename("   "), "untitled.html");
    }

    #[test]
    fn test_artifact_headers() {
        let artifact = to_downloadable_artifact("<p>x</p>", "Demo Page");

        assert_eq!(artifact.filename, "demo-page.html");
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"demo-page.html\""
        );
        assert_eq!(artifact.content, "<p>x</p>");
    }

    #[test]
    fn test_non_ascii_filename_gets_extended_form() {
        let artifact = to_downloadable_artifact("<p>x</p>", "Ünïcode Café");

        assert_eq!(artifact.filename, "ünïcode-café.html");
        let header = artifact.content_disposition();
        assert!(header.is_ascii(), "{header}");
        assert_eq!(
            header,
            "attachment; filename=\"_n_code-caf_.html\"; \
             filename*=UTF-8''%C3%BCn%C3%AFcode-caf%C3%A9.html"
        );
    }

    #[test]
    fn test_export_buffers_has_raw_script() {
        let buffers = SourceBuffers::new("<h1>Hi</h1>", "h1 { color: red; }", "boom()");

        let artifact = export_buffers(&buffers, "Demo");

        assert!(artifact.content.contains("<title>Demo</title>"));
        assert!(artifact.content.contains("boom()"));
        assert!(!artifact.content.contains("catch (error)"));
    }

    #[test]
    fn test_write_into_directory() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("exports");
        let artifact = to_downloadable_artifact("<p>saved</p>", "My Page");

        let path = artifact.write_into(&out).unwrap();

        assert_eq!(path, out.join("my-page.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>saved</p>");
    }

    #[test]
    fn test_write_into_rejects_file_path() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let result = to_downloadable_artifact("", "x").write_into(&file);

        assert!(matches!(result, Err(ExportError::NotADirectory(_))));
    }

    #[test]
    fn test_save_snapshot_never_overwrites() {
        let store = MemorySnapshotStore::new();
        let buffers = SourceBuffers::defaults();

        let first = save_snapshot(&store, &buffers, "Same title").unwrap();
        let second = save_snapshot(&store, &buffers, "Same title").unwrap();

        assert_ne!(first.key, second.key);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(first.record.html, buffers.markup);
        assert_eq!(first.record.css, buffers.style);
        assert_eq!(first.record.js, buffers.script);
    }
}
