//! Document assembly for the live preview and for downloads.
//!
//! The preview document wraps the user script in an error-trapping
//! harness so a runtime exception always shows up inside the rendered
//! page. The export document keeps the script untouched.

use core_types::SourceBuffers;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// First `<head ...>...</head>` region, matched lazily and case-insensitively.
static HEAD_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").expect("Invalid head region regex")
});

const META_CHARSET: &str = r#"<meta charset="UTF-8">"#;
const META_VIEWPORT: &str =
    r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#;

/// Class carried by the banner the harness appends on a script error.
pub const ERROR_BANNER_CLASS: &str = "sandbox-error";

const ERROR_BANNER_STYLE: &str = "margin:1rem 0;padding:0.75rem 1rem;border-radius:6px;\
background:#fee2e2;color:#991b1b;border:1px solid #fca5a5;\
font-family:ui-monospace,monospace;white-space:pre-wrap;";

/// A complete preview document.
///
/// Produced wholesale by [`assemble`] and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    text: String,
    digest: String,
}

impl AssembledDocument {
    /// Assemble the preview document for a set of buffers.
    pub fn from_buffers(buffers: &SourceBuffers) -> Self {
        assemble(&buffers.markup, &buffers.style, &buffers.script)
    }

    /// The document text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Hex SHA-256 of the document text.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }

    fn new(text: String) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        Self { text, digest }
    }
}

impl fmt::Display for AssembledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the live-preview document from the three buffers.
///
/// Total for any input: empty buffers give a minimal valid document.
pub fn assemble(markup: &str, style: &str, script: &str) -> AssembledDocument {
    let body = strip_head(markup);
    let harness = wrap_script(script);

    let mut text = String::with_capacity(
        markup.len() + style.len() + script.len() + harness.len() + 256,
    );
    text.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    text.push_str(META_CHARSET);
    text.push('\n');
    text.push_str(META_VIEWPORT);
    text.push('\n');
    push_style(&mut text, style);
    text.push_str("</head>\n<body>\n");
    text.push_str(&body);
    text.push_str("\n<script>\n");
    text.push_str(&harness);
    text.push_str("\n</script>\n</body>\n</html>\n");

    let document = AssembledDocument::new(text);
    debug!(
        bytes = document.len(),
        digest = %document.digest(),
        head_stripped = matches!(body, Cow::Owned(_)),
        "assembled preview document"
    );
    document
}

/// Build the downloadable document: titled, and with the script left raw.
pub fn assemble_export(markup: &str, style: &str, script: &str, title: &str) -> String {
    let body = strip_head(markup);

    let mut text = String::with_capacity(markup.len() + style.len() + script.len() + 256);
    text.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    text.push_str(META_CHARSET);
    text.push('\n');
    text.push_str(META_VIEWPORT);
    text.push('\n');
    text.push_str("<title>");
    text.push_str(&escape_html(title));
    text.push_str("</title>\n");
    push_style(&mut text, style);
    text.push_str("</head>\n<body>\n");
    text.push_str(&body);
    text.push_str("\n<script>\n");
    text.push_str(script);
    text.push_str("\n</script>\n</body>\n</html>\n");
    text
}

/// Remove the first `<head>...</head>` region from user markup.
///
/// Only the first region goes; any later ones are left in place.
pub fn strip_head(markup: &str) -> Cow<'_, str> {
    HEAD_REGION.replace(markup, "")
}

/// Wrap user script in the try/catch harness used by the preview.
pub fn wrap_script(script: &str) -> String {
    format!(
        r#"try {{
{script}
}} catch (error) {{
  const banner = document.createElement("div");
  banner.className = "{ERROR_BANNER_CLASS}";
  banner.style.cssText = "{ERROR_BANNER_STYLE}";
  banner.textContent = "Error: " + (error && error.message ? error.message : String(error));
  document.body.appendChild(banner);
}}"#
    )
}

fn push_style(text: &mut String, style: &str) {
    text.push_str("<style>");
    text.push_str(style);
    text.push_str("</style>\n");
}

/// Escape text for use inside an HTML element or quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(document: &str) -> &str {
        let start = document.find("<body>").unwrap();
        &document[start..]
    }

    #[test]
    fn test_scenario_heading_style_and_log() {
        let doc = assemble("<h1>Hi</h1>", "h1{color:red}", "console.log(1)");
        let text = doc.as_str();

        assert!(text.contains("<style>h1{color:red}</style>"));
        assert!(text.contains("<h1>Hi</h1>"));

        // The user script sits inside the try block
        let try_at = text.find("try {").unwrap();
        let script_at = text.find("console.log(1)").unwrap();
        let catch_at = text.find("} catch (error)").unwrap();
        assert!(try_at < script_at && script_at < catch_at);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let inputs = [
            ("", "", ""),
            ("<p>a</p>", "p{}", "x()"),
            ("<HEAD><title>t</title></HEAD><b>b</b>", "", "throw 1"),
        ];

        for (markup, style, script) in inputs {
            let first = assemble(markup, style, script);
            let second = assemble(markup, style, script);
            assert_eq!(first.as_str(), second.as_str());
            assert_eq!(first.digest(), second.digest());
        }
    }

    #[test]
    fn test_empty_buffers_give_minimal_document() {
        let doc = assemble("", "", "");
        let text = doc.as_str();

        assert!(text.starts_with("<!DOCTYPE html>"));
        assert!(text.contains(META_CHARSET));
        assert!(text.contains(META_VIEWPORT));
        assert!(text.contains("<style></style>"));
        assert!(text.contains("<body>"));
        assert!(text.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_head_region_is_stripped_any_case() {
        for markup in [
            "<head><title>Mine</title></head><p>body</p>",
            "<HEAD><title>Mine</title></HEAD><p>body</p>",
            "<Head lang=\"en\">\n<meta name=\"x\">\n</hEaD ><p>body</p>",
        ] {
            let doc = assemble(markup, "", "");
            let body = body_of(doc.as_str());

            assert!(!body.to_lowercase().contains("<head"), "{markup}");
            assert!(!body.contains("Mine"));
            assert!(body.contains("<p>body</p>"));
        }
    }

    #[test]
    fn test_markup_without_head_is_unchanged() {
        let markup = "<header>Top</header>\n<main><p>Text</p></main>";

        assert!(matches!(strip_head(markup), Cow::Borrowed(_)));

        let doc = assemble(markup, "", "");
        assert!(body_of(doc.as_str()).contains(markup));
    }

    #[test]
    fn test_only_first_head_region_is_stripped() {
        let markup = "<head>one</head><p>mid</p><head>two</head>";

        let stripped = strip_head(markup);

        assert_eq!(stripped, "<p>mid</p><head>two</head>");
    }

    #[test]
    fn test_harness_shows_error_message() {
        let wrapped = wrap_script("throw new Error(\"x\")");

        assert!(wrapped.starts_with("try {\nthrow new Error(\"x\")\n}"));
        assert!(wrapped.contains("error.message"));
        assert!(wrapped.contains(ERROR_BANNER_CLASS));
        assert!(wrapped.contains("document.body.appendChild(banner)"));
    }

    #[test]
    fn test_export_has_raw_script_and_title() {
        let html = assemble_export(
            "<head><title>old</title></head><h1>Hi</h1>",
            "h1{color:red}",
            "console.log(1)",
            "Tom & Jerry <3",
        );

        assert!(html.contains("<title>Tom &amp; Jerry &lt;3</title>"));
        assert!(html.contains("<style>h1{color:red}</style>"));
        assert!(html.contains("<script>\nconsole.log(1)\n</script>"));
        assert!(!html.contains("try {"));
        assert!(!html.contains("old"));
    }

    #[test]
    fn test_from_buffers_matches_assemble() {
        let buffers = SourceBuffers::defaults();

        let doc = AssembledDocument::from_buffers(&buffers);

        assert_eq!(
            doc,
            assemble(&buffers.markup, &buffers.style, &buffers.script)
        );
        assert_eq!(doc.digest().len(), 64);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
