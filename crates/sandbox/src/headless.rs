//! Headless execution of preview documents in an embedded script engine.
//!
//! Every load builds a brand-new engine context, seeds it with a small
//! DOM shim and runs the document's inline scripts in order. The shim has
//! no storage, no cookies, no network and no navigation.

use assembler::{AssembledDocument, ERROR_BANNER_CLASS};
use boa_engine::{Context, JsObject, JsValue, Source};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::boundary::{ExecutionBoundary, RenderedOutput, SandboxSession};
use crate::{Capability, Result, SandboxError, SandboxPolicy};

const SHIM: &str = include_str!("headless_shim.js");

static SCRIPT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("Invalid script element regex")
});

static ID_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<([a-z][a-z0-9-]*)\b[^>]*?\bid\s*=\s*["']([^"']+)["']"#)
        .expect("Invalid id element regex")
});

static SRC_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsrc\s*=").expect("Invalid src attribute regex"));

/// Runtime hardening knobs for the headless engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
    pub stack_size_limit: usize,
    /// Scripts longer than this are skipped
    pub max_script_bytes: usize,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            loop_iteration_limit: 1_000_000,
            recursion_limit: 256,
            stack_size_limit: 10 * 1024,
            max_script_bytes: 512 * 1024,
        }
    }
}

/// One console call made by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub level: String,
    pub text: String,
}

/// An element the document's scripts appended to `document.body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendedNode {
    pub tag: String,
    pub class_name: String,
    pub text: String,
}

/// What happened while executing a document headlessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlessReport {
    pub scripts_executed: usize,
    pub scripts_skipped: usize,
    pub console: Vec<ConsoleLine>,
    pub appended: Vec<AppendedNode>,
    /// Errors no in-page handler caught, such as syntax errors
    pub uncaught: Vec<String>,
    pub title: String,
}

impl HeadlessReport {
    /// Text of the error banners the preview harness rendered.
    pub fn error_banners(&self) -> Vec<&str> {
        self.appended
            .iter()
            .filter(|n| n.class_name.split_whitespace().any(|c| c == ERROR_BANNER_CLASS))
            .map(|n| n.text.as_str())
            .collect()
    }

    /// Text of everything scripts added to the page.
    pub fn visible_text(&self) -> Vec<&str> {
        self.appended.iter().map(|n| n.text.as_str()).collect()
    }

    /// Console output, one entry per call.
    pub fn console_text(&self) -> Vec<&str> {
        self.console.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Shape of the JSON the shim hands back.
#[derive(Debug, Deserialize)]
struct ShimReport {
    console: Vec<ConsoleLine>,
    appended: Vec<AppendedNode>,
    title: String,
}

#[derive(Debug, Serialize)]
struct SeededElement<'a> {
    tag: String,
    id: &'a str,
}

/// Boundary that executes documents in an embedded JavaScript engine.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBoundary {
    config: HeadlessConfig,
}

impl HeadlessBoundary {
    pub fn new(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// Execute a document and report what it did.
    pub fn execute(
        &self,
        document: &AssembledDocument,
        policy: &SandboxPolicy,
    ) -> Result<HeadlessReport> {
        let scripts: Vec<(&str, &str)> = SCRIPT_ELEMENT
            .captures_iter(document.as_str())
            .filter_map(|caps| {
                let attributes = caps.get(1)?.as_str();
                let body = caps.get(2)?.as_str();
                Some((attributes, body))
            })
            .collect();

        let mut report = HeadlessReport::default();

        if !policy.permits(Capability::Scripts) {
            report.scripts_skipped = scripts.len();
            debug!(skipped = scripts.len(), "scripts not permitted by policy");
            return Ok(report);
        }

        let mut context = Context::default();
        context
            .runtime_limits_mut()
            .set_loop_iteration_limit(self.config.loop_iteration_limit);
        context
            .runtime_limits_mut()
            .set_recursion_limit(self.config.recursion_limit);
        context
            .runtime_limits_mut()
            .set_stack_size_limit(self.config.stack_size_limit);

        let bootstrap = build_bootstrap(document.as_str(), policy)?;
        let collect = context
            .eval(Source::from_bytes(bootstrap.as_bytes()))
            .map_err(|e| SandboxError::Engine(format!("bootstrap failed: {e}")))?
            .as_callable()
            .cloned()
            .ok_or_else(|| SandboxError::Engine("bootstrap returned no report hook".into()))?;

        for (attributes, body) in scripts {
            if SRC_ATTRIBUTE.is_match(attributes) || body.len() > self.config.max_script_bytes {
                report.scripts_skipped += 1;
                continue;
            }

            match context.eval(Source::from_bytes(body.as_bytes())) {
                Ok(_) => report.scripts_executed += 1,
                Err(error) => report.uncaught.push(error.to_string()),
            }
        }

        // The document can still sabotage the report, e.g. through
        // Object.prototype.toJSON. That is its own error, not the boundary's.
        match collect_report(&collect, &mut context) {
            Ok(shim) => {
                report.console = shim.console;
                report.appended = shim.appended;
                report.title = shim.title;
            }
            Err(reason) => report.uncaught.push(format!("page state unavailable: {reason}")),
        }

        if !report.uncaught.is_empty() {
            warn!(count = report.uncaught.len(), "document raised uncaught errors");
        }
        Ok(report)
    }
}

impl ExecutionBoundary for HeadlessBoundary {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn load(
        &self,
        session: &SandboxSession,
        document: &AssembledDocument,
        policy: &SandboxPolicy,
    ) -> Result<RenderedOutput> {
        let report = self.execute(document, policy)?;
        debug!(
            session = %session.id,
            executed = report.scripts_executed,
            skipped = report.scripts_skipped,
            banners = report.error_banners().len(),
            "headless run finished"
        );
        Ok(RenderedOutput::Headless(report))
    }
}

fn collect_report(
    collect: &JsObject,
    context: &mut Context,
) -> std::result::Result<ShimReport, String> {
    let raw = collect
        .call(&JsValue::undefined(), &[], context)
        .map_err(|e| e.to_string())?;
    let Some(text) = raw.as_string() else {
        return Err(format!("expected a JSON string, got {}", raw.type_of()));
    };
    serde_json::from_str(&text.to_std_string_escaped()).map_err(|e| e.to_string())
}

fn build_bootstrap(document: &str, policy: &SandboxPolicy) -> Result<String> {
    let elements: Vec<SeededElement<'_>> = ID_ELEMENT
        .captures_iter(document)
        .filter_map(|caps| {
            Some(SeededElement {
                tag: caps.get(1)?.as_str().to_lowercase(),
                id: caps.get(2)?.as_str(),
            })
        })
        .collect();

    let allow_modals = if policy.permits(Capability::Modals) {
        "true"
    } else {
        "false"
    };

    Ok(SHIM
        .replace("__HW_ALLOW_MODALS__", allow_modals)
        .replace("__HW_ELEMENTS__", &serde_json::to_string(&elements)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembler::assemble;

    fn run(markup: &str, script: &str) -> HeadlessReport {
        HeadlessBoundary::default()
            .execute(&assemble(markup, "", script), &SandboxPolicy::default())
            .unwrap()
    }

    #[test]
    fn test_thrown_error_becomes_banner() {
        let report = run("<p>hi</p>", r#"throw new Error("x")"#);

        assert_eq!(report.error_banners(), vec!["Error: x"]);
        assert!(report.uncaught.is_empty());
    }

    #[test]
    fn test_console_output_is_captured() {
        let report = run("", r#"console.log("A", 1, { b: true })"#);

        assert_eq!(report.console_text(), vec![r#"A 1 {"b":true}"#]);
        assert_eq!(report.scripts_executed, 1);
    }

    #[test]
    fn test_seeded_elements_are_reachable() {
        let report = run(
            r#"<button id="greet">Hi</button>"#,
            r#"
            const button = document.getElementById("greet");
            button.addEventListener("click", () => console.log("clicked"));
            button.click();
            "#,
        );

        assert!(report.error_banners().is_empty());
        assert_eq!(report.console_text(), vec!["clicked"]);
    }

    #[test]
    fn test_default_template_runs_cleanly() {
        let buffers = core_types::SourceBuffers::defaults();
        let report = run(&buffers.markup, &buffers.script);

        assert!(report.error_banners().is_empty());
        assert!(report.uncaught.is_empty());
    }

    #[test]
    fn test_storage_and_cookies_are_blocked() {
        for script in [
            r#"localStorage.setItem("k", "v")"#,
            r#"document.cookie = "a=b""#,
            r#"location.assign("https://example.com")"#,
            r#"window.location = "https://example.com""#,
        ] {
            let report = run("", script);
            let banners = report.error_banners();
            assert_eq!(banners.len(), 1, "{script}");
            assert!(banners[0].contains("SecurityError"), "{script}: {banners:?}");
        }
    }

    #[test]
    fn test_network_globals_are_absent() {
        let report = run("", r#"fetch("https://example.com")"#);

        assert_eq!(report.error_banners().len(), 1);
    }

    #[test]
    fn test_syntax_error_is_recorded_not_raised() {
        let report = run("", "let = ;");

        assert_eq!(report.scripts_executed, 0);
        assert_eq!(report.uncaught.len(), 1);
        assert!(report.error_banners().is_empty());
    }

    #[test]
    fn test_modals_follow_policy() {
        let document = assemble("", "", r#"alert("hey")"#);

        let denied = HeadlessBoundary::default()
            .execute(&document, &SandboxPolicy::default())
            .unwrap();
        assert_eq!(denied.console[0].level, "warn");

        let policy = SandboxPolicy::default().grant(Capability::Modals).unwrap();
        let allowed = HeadlessBoundary::default()
            .execute(&document, &policy)
            .unwrap();
        assert_eq!(allowed.console[0].level, "alert");
        assert_eq!(allowed.console[0].text, "hey");
    }

    #[test]
    fn test_scripts_skipped_without_capability() {
        let document = assemble("<script>console.log(1)</script>", "", "console.log(2)");

        let report = HeadlessBoundary::default()
            .execute(&document, &SandboxPolicy::locked())
            .unwrap();

        assert_eq!(report.scripts_skipped, 2);
        assert!(report.console.is_empty());
    }

    #[test]
    fn test_external_scripts_are_skipped() {
        let report = run(
            r#"<script src="https://cdn.example.com/lib.js"></script>"#,
            "console.log(1)",
        );

        assert_eq!(report.scripts_skipped, 1);
        assert_eq!(report.scripts_executed, 1);
    }

    #[test]
    fn test_runaway_loop_is_contained() {
        let report = run("", "while (true) {}");

        // The engine limit surfaces as an error inside the page, never a panic
        assert_eq!(report.error_banners().len() + report.uncaught.len(), 1);
    }

    #[test]
    fn test_each_execution_starts_clean() {
        let boundary = HeadlessBoundary::default();
        let policy = SandboxPolicy::default();

        boundary
            .execute(&assemble("", "", "globalThis.leaked = 42;"), &policy)
            .unwrap();
        let second = boundary
            .execute(
                &assemble("", "", r#"console.log(typeof globalThis.leaked)"#),
                &policy,
            )
            .unwrap();

        assert_eq!(second.console_text(), vec!["undefined"]);
    }

    #[test]
    fn test_appending_missing_element_becomes_banner() {
        let report = run(
            "<p>hi</p>",
            r#"document.body.appendChild(document.getElementById("missing"));"#,
        );

        let banners = report.error_banners();
        assert_eq!(banners.len(), 1);
        assert!(banners[0].contains("appendChild"), "{banners:?}");
        assert!(report.uncaught.is_empty());
    }

    #[test]
    fn test_appending_primitives_is_rejected() {
        for script in [
            r#"document.body.appendChild("text")"#,
            "document.body.appendChild(42)",
            r#"document.createElement("div").appendChild(undefined)"#,
        ] {
            let report = run("", script);
            assert_eq!(report.error_banners().len(), 1, "{script}");
        }
    }

    #[test]
    fn test_appending_plain_object_is_tolerated() {
        let report = run("", "document.body.appendChild({})");

        assert_eq!(report.appended.len(), 1);
        assert_eq!(report.appended[0].tag, "");
        assert_eq!(report.appended[0].text, "");
        assert!(report.error_banners().is_empty());
    }

    #[test]
    fn test_overwritten_json_does_not_break_report() {
        let report = run(
            "",
            r#"
            JSON.stringify = function () { return "nope"; };
            String = function () { return "nope"; };
            console.log("still here", { a: 1 });
            "#,
        );

        assert_eq!(report.console_text(), vec![r#"still here {"a":1}"#]);
        assert!(report.uncaught.is_empty());
    }

    #[test]
    fn test_polluted_prototype_is_reported_as_uncaught() {
        let report = run("", "Object.prototype.toJSON = function () { return 1; };");

        assert_eq!(report.scripts_executed, 1);
        assert_eq!(report.uncaught.len(), 1);
        assert!(report.uncaught[0].contains("page state unavailable"));
    }

    #[test]
    fn test_report_hook_is_not_reachable_from_page() {
        let report = run("", "console.log(typeof __hw_report)");

        assert_eq!(report.console_text(), vec!["undefined"]);
    }
}
