//! Core types for the Hello World playground.
//!
//! This crate defines the shared data structures used across
//! the editor, sandbox, export, storage, and web components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schema version for database migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Markup loaded into a fresh editor or after a reset.
pub const DEFAULT_MARKUP: &str = r#"<h1>Hello, World!</h1>
<p>Edit the HTML, CSS and JavaScript panes, then press Run.</p>
<button id="greet">Say hello</button>"#;

/// Style loaded into a fresh editor or after a reset.
pub const DEFAULT_STYLE: &str = r#"body {
  font-family: system-ui, sans-serif;
  padding: 1rem;
}

h1 {
  color: #4f46e5;
}"#;

/// Script loaded into a fresh editor or after a reset.
pub const DEFAULT_SCRIPT: &str = r#"const button = document.getElementById("greet");
button.addEventListener("click", () => {
  console.log("Hello from JavaScript!");
});"#;

/// The three independently editable source buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HTML markup
    Markup,
    /// CSS style sheet
    Style,
    /// JavaScript
    Script,
}

impl SourceKind {
    /// All kinds in editor order.
    pub const ALL: [SourceKind; 3] = [SourceKind::Markup, SourceKind::Style, SourceKind::Script];

    /// Lower-case label used in UIs and on the command line.
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Markup => "markup",
            SourceKind::Style => "style",
            SourceKind::Script => "script",
        }
    }

    /// Conventional file name for this buffer when written to disk.
    pub fn file_name(self) -> &'static str {
        match self {
            SourceKind::Markup => "index.html",
            SourceKind::Style => "style.css",
            SourceKind::Script => "script.js",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markup" | "html" => Ok(SourceKind::Markup),
            "style" | "css" => Ok(SourceKind::Style),
            "script" | "js" | "javascript" => Ok(SourceKind::Script),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Contents of the markup, style and script buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBuffers {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl SourceBuffers {
    /// Create buffers from the three texts.
    pub fn new(
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
        }
    }

    /// The built-in starter template.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_MARKUP, DEFAULT_STYLE, DEFAULT_SCRIPT)
    }

    /// Get the text of one buffer.
    pub fn get(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Markup => &self.markup,
            SourceKind::Style => &self.style,
            SourceKind::Script => &self.script,
        }
    }

    /// Replace the text of one buffer.
    pub fn set(&mut self, kind: SourceKind, text: String) {
        match kind {
            SourceKind::Markup => self.markup = text,
            SourceKind::Style => self.style = text,
            SourceKind::Script => self.script = text,
        }
    }
}

/// A saved project, in the shape written to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub html: String,
    pub css: String,
    pub js: String,
    pub title: String,
}

impl SnapshotRecord {
    /// Capture the buffers under a project title.
    pub fn from_buffers(buffers: &SourceBuffers, title: &str) -> Self {
        Self {
            html: buffers.markup.clone(),
            css: buffers.style.clone(),
            js: buffers.script.clone(),
            title: title.to_string(),
        }
    }

    /// Turn the record back into editor buffers.
    pub fn to_buffers(&self) -> SourceBuffers {
        SourceBuffers::new(&self.html, &self.css, &self.js)
    }
}

/// A snapshot record together with its storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Timestamp-derived key, unique per store
    pub key: String,
    pub record: SnapshotRecord,
    pub created_at: DateTime<Utc>,
}

/// Who is using the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Guest,
    SignedIn {
        uid: String,
        display_name: String,
        email: String,
    },
}

impl Identity {
    /// Name shown in headers and greetings.
    pub fn display_label(&self) -> &str {
        match self {
            Identity::Guest => "Guest",
            Identity::SignedIn {
                display_name,
                email,
                ..
            } => {
                if display_name.is_empty() {
                    email
                } else {
                    display_name
                }
            }
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Teacher => f.write_str("teacher"),
        }
    }
}

/// A learner or teacher profile held by the external database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a profile stamped with the current time.
    pub fn new(uid: String, display_name: String, email: String) -> Self {
        Self {
            uid,
            display_name,
            email,
            created_at: Utc::now(),
        }
    }

    /// The signed-in identity for this profile.
    pub fn identity(&self) -> Identity {
        Identity::SignedIn {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Category of static learning content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Achievement,
    Challenge,
    Curriculum,
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "achievement" | "achievements" => Ok(ContentKind::Achievement),
            "challenge" | "challenges" => Ok(ContentKind::Challenge),
            "curriculum" | "curricula" => Ok(ContentKind::Curriculum),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

/// One achievement, challenge or curriculum entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique content identifier
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    /// Learning track, e.g. "html", "javascript", "math-grade-3"
    pub track: String,
    /// Starter project for challenges (optional)
    #[serde(default)]
    pub starter: Option<SourceBuffers>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_get_and_set() {
        let mut buffers = SourceBuffers::default();

        buffers.set(SourceKind::Markup, "<p>x</p>".to_string());
        buffers.set(SourceKind::Script, "let a = 1;".to_string());

        assert_eq!(buffers.get(SourceKind::Markup), "<p>x</p>");
        assert_eq!(buffers.get(SourceKind::Style), "");
        assert_eq!(buffers.get(SourceKind::Script), "let a = 1;");
    }

    #[test]
    fn test_defaults_are_not_empty() {
        let buffers = SourceBuffers::defaults();

        for kind in SourceKind::ALL {
            assert!(!buffers.get(kind).is_empty(), "{kind} default is empty");
        }
        assert!(buffers.markup.contains(r#"id="greet""#));
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("markup".parse(), Ok(SourceKind::Markup));
        assert_eq!("HTML".parse(), Ok(SourceKind::Markup));
        assert_eq!("css".parse(), Ok(SourceKind::Style));
        assert_eq!("js".parse(), Ok(SourceKind::Script));
        assert!("python".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_snapshot_record_field_names() {
        let buffers = SourceBuffers::new("<h1>Hi</h1>", "h1{}", "go()");
        let record = SnapshotRecord::from_buffers(&buffers, "Demo");

        let json = serde_json::to_value(&record).unwrap();

        // Local storage records use html/css/js/title
        assert_eq!(json["html"], "<h1>Hi</h1>");
        assert_eq!(json["css"], "h1{}");
        assert_eq!(json["js"], "go()");
        assert_eq!(json["title"], "Demo");
        assert_eq!(record.to_buffers(), buffers);
    }

    #[test]
    fn test_identity_display_label() {
        assert_eq!(Identity::Guest.display_label(), "Guest");

        let named = Identity::SignedIn {
            uid: "u1".to_string(),
            display_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(named.display_label(), "Ada");

        let unnamed = Identity::SignedIn {
            uid: "u2".to_string(),
            display_name: String::new(),
            email: "grace@example.com".to_string(),
        };
        assert_eq!(unnamed.display_label(), "grace@example.com");
        assert!(!unnamed.is_guest());
    }

    #[test]
    fn test_identity_serialization() {
        let json = serde_json::to_string(&Identity::Guest).unwrap();
        assert_eq!(json, r#"{"kind":"guest"}"#);

        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_guest());
    }

    #[test]
    fn test_role_round_trip_through_text() {
        for role in [Role::Student, Role::Teacher] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_content_item_without_starter() {
        let json = r#"{
            "id": "first-page",
            "kind": "challenge",
            "title": "Your first page",
            "description": "Write a heading",
            "track": "html"
        }"#;

        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ContentKind::Challenge);
        assert!(item.starter.is_none());
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(SCHEMA_VERSION, 1, "Current schema version");
    }
}
