//! User-facing reporting.
//!
//! Everything the workflow wants the operator to see goes through a
//! [`Reporter`] as a [`ReportEvent`]. Two terminal reporters exist:
//! [`ElegantReporter`] (ANSI colours) and [`CiReporter`] (plain text, no
//! escape sequences). [`MemoryReporter`] records events for tests.

use std::io::Write;
use std::sync::Mutex;

use anstyle::{AnsiColor, Color, Style};
use serde::{Deserialize, Serialize};

use crate::domain::context::{EnvSnapshot, InvocationContext};

/// Guard rejection text.
pub const GUARD_REJECTION: &str =
    "'npm publish' is forbidden for this package. Please use 'npm run publish-please' instead.";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A labelled group of error lines, one per failing validation or fatal
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBlock {
    /// Heading of the block, the failing validation's status text.
    pub title: String,
    /// Bullet lines rendered under the heading.
    pub lines: Vec<String>,
}

impl ErrorBlock {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }
}

/// Summary shown before (or instead of) the real release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub package_name: String,
    pub version: String,
    pub command: String,
    pub tag: String,
    pub artifact: String,
    /// Files npm would put in the tarball, when known.
    pub files: Vec<String>,
}

/// Result mark attached to a finished validation status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMark {
    Passed,
    Failed,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportEvent {
    DryRunStarted,
    /// A workflow phase such as "Running pre-publish script".
    Step(String),
    ValidationStarted(String),
    ValidationFinished { status_text: String, mark: StatusMark },
    Errors(Vec<ErrorBlock>),
    FatalError(String),
    ReleaseInfo(ReleaseInfo),
    SafeToPublish(String),
    Released(String),
    Declined,
    GuardAllowed,
    GuardRejected,
    Info(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait Reporter: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Pick the reporter for this process: plain text when `--ci` was given,
/// npm forwarded `--ci`, or a `CI` variable is present.
pub fn select_reporter(
    ci_flag: bool,
    ctx: &InvocationContext,
    env: &EnvSnapshot,
) -> Box<dyn Reporter> {
    if is_ci(ci_flag, ctx, env) {
        Box::new(CiReporter::stdout())
    } else {
        Box::new(ElegantReporter::stdout())
    }
}

pub fn is_ci(ci_flag: bool, ctx: &InvocationContext, env: &EnvSnapshot) -> bool {
    ci_flag || ctx.ci || env.get("CI").is_some_and(|v| !v.is_empty() && v != "false")
}

type Sink = Mutex<Box<dyn Write + Send>>;

fn write_sink(sink: &Sink, text: &str) {
    if let Ok(mut out) = sink.lock() {
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

// ---------------------------------------------------------------------------
// Elegant
// ---------------------------------------------------------------------------

pub struct ElegantReporter {
    out: Sink,
}

const RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
const BOLD: Style = Style::new().bold();

fn paint(style: Style, text: &str) -> String {
    format!("{style}{text}{style:#}")
}

impl ElegantReporter {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn render(&self, event: &ReportEvent) -> String {
        match event {
            ReportEvent::DryRunStarted => {
                paint(YELLOW.bold(), "=== dry mode activated ===")
            }
            ReportEvent::Step(title) => paint(YELLOW, &format!("== {title} ==")),
            ReportEvent::ValidationStarted(text) => format!("  - {text}"),
            ReportEvent::ValidationFinished { status_text, mark } => match mark {
                StatusMark::Passed => format!("  {} {status_text}", paint(GREEN, "✓")),
                StatusMark::Failed => format!("  {} {status_text}", paint(RED, "✖")),
                StatusMark::Unsupported => format!("  {} {status_text}", paint(YELLOW, "!")),
            },
            ReportEvent::Errors(blocks) => {
                let mut out = paint(RED.bold(), "ERRORS");
                for block in blocks {
                    out.push('\n');
                    out.push_str(&paint(BOLD, &format!("  {}", block.title)));
                    for line in &block.lines {
                        out.push('\n');
                        out.push_str(&paint(RED, &format!("    * {line}")));
                    }
                }
                out
            }
            ReportEvent::FatalError(msg) => {
                format!("{}\n{}", paint(RED.bold(), "ERRORS"), paint(RED, &format!("  * {msg}")))
            }
            ReportEvent::ReleaseInfo(info) => render_release_info(info, |s| paint(BOLD, s)),
            ReportEvent::SafeToPublish(name) => {
                paint(GREEN.bold(), &format!("{name} is safe to be published."))
            }
            ReportEvent::Released(cmd) => paint(GREEN, &format!("Executed: {cmd}")),
            ReportEvent::Declined => paint(YELLOW, "Release cancelled."),
            ReportEvent::GuardAllowed => paint(GREEN, "publish-please guard passed"),
            ReportEvent::GuardRejected => paint(RED, GUARD_REJECTION),
            ReportEvent::Info(msg) => msg.clone(),
        }
    }
}

impl Reporter for ElegantReporter {
    fn report(&self, event: &ReportEvent) {
        write_sink(&self.out, &self.render(event));
    }
}

// ---------------------------------------------------------------------------
// CI
// ---------------------------------------------------------------------------

pub struct CiReporter {
    out: Sink,
}

impl CiReporter {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn render(&self, event: &ReportEvent) -> String {
        render_plain(event)
    }
}

impl Reporter for CiReporter {
    fn report(&self, event: &ReportEvent) {
        write_sink(&self.out, &self.render(event));
    }
}

fn render_plain(event: &ReportEvent) -> String {
    match event {
        ReportEvent::DryRunStarted => "=== dry mode activated ===".to_string(),
        ReportEvent::Step(title) => format!("-- {title} --"),
        ReportEvent::ValidationStarted(text) => format!("  - {text}"),
        ReportEvent::ValidationFinished { status_text, mark } => {
            let mark = match mark {
                StatusMark::Passed => "[OK]",
                StatusMark::Failed => "[FAILED]",
                StatusMark::Unsupported => "[UNSUPPORTED]",
            };
            format!("  {mark} {status_text}")
        }
        ReportEvent::Errors(blocks) => {
            let mut out = "ERRORS".to_string();
            for block in blocks {
                out.push_str(&format!("\n  {}", block.title));
                for line in &block.lines {
                    out.push_str(&format!("\n    * {line}"));
                }
            }
            out
        }
        ReportEvent::FatalError(msg) => format!("ERRORS\n  * {msg}"),
        ReportEvent::ReleaseInfo(info) => render_release_info(info, str::to_string),
        ReportEvent::SafeToPublish(name) => format!("{name} is safe to be published."),
        ReportEvent::Released(cmd) => format!("Executed: {cmd}"),
        ReportEvent::Declined => "Release cancelled.".to_string(),
        ReportEvent::GuardAllowed => "publish-please guard passed".to_string(),
        ReportEvent::GuardRejected => GUARD_REJECTION.to_string(),
        ReportEvent::Info(msg) => msg.clone(),
    }
}

fn render_release_info(info: &ReleaseInfo, heading: impl Fn(&str) -> String) -> String {
    let mut out = heading("Release info");
    out.push_str(&format!("\n  package:  {}@{}", info.package_name, info.version));
    out.push_str(&format!("\n  command:  {}", info.command));
    out.push_str(&format!("\n  tag:      {}", info.tag));
    out.push_str(&format!("\n  artifact: {}", info.artifact));
    if !info.files.is_empty() {
        out.push_str("\n  files:");
        for file in &info.files {
            out.push_str(&format!("\n    {file}"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Records every event. Rendered text uses the plain CI format.
#[derive(Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn text(&self) -> String {
        self.events()
            .iter()
            .map(render_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn blocks() -> Vec<ErrorBlock> {
        vec![
            ErrorBlock::new("Validating branch", vec!["first".to_string()]),
            ErrorBlock::new("Validating git tag", vec!["second".to_string()]),
        ]
    }

    #[test]
    fn test_elegant_guard_rejection_is_red() {
        let buf = SharedBuf::default();
        let reporter = ElegantReporter::with_writer(Box::new(buf.clone()));
        reporter.report(&ReportEvent::GuardRejected);
        let out = buf.contents();
        assert!(out.contains("'npm publish' is forbidden for this package"));
        assert!(out.contains("\u{1b}[31m"));
    }

    #[test]
    fn test_ci_output_has_no_escapes() {
        let buf = SharedBuf::default();
        let reporter = CiReporter::with_writer(Box::new(buf.clone()));
        reporter.report(&ReportEvent::GuardRejected);
        reporter.report(&ReportEvent::Errors(blocks()));
        let out = buf.contents();
        assert!(out.contains("'npm publish' is forbidden for this package"));
        assert!(!out.contains('\u{1b}'));
        assert!(out.contains(
            "ERRORS\n  Validating branch\n    * first\n  Validating git tag\n    * second"
        ));
    }

    #[test]
    fn test_elegant_errors_are_grouped_under_titles() {
        let reporter = ElegantReporter::with_writer(Box::new(std::io::sink()));
        let text = reporter.render(&ReportEvent::Errors(blocks()));
        let branch = text.find("Validating branch").unwrap();
        let first = text.find("* first").unwrap();
        let tag = text.find("Validating git tag").unwrap();
        let second = text.find("* second").unwrap();
        assert!(branch < first && first < tag && tag < second);
    }

    #[test]
    fn test_release_info_lists_artifact() {
        let info = ReleaseInfo {
            package_name: "testing-repo".to_string(),
            version: "0.0.0".to_string(),
            command: "npm publish --tag latest --with-publish-please".to_string(),
            tag: "latest".to_string(),
            artifact: "testing-repo-0.0.0.tgz".to_string(),
            files: vec!["package.json".to_string()],
        };
        let text = render_plain(&ReportEvent::ReleaseInfo(info));
        assert!(text.starts_with("Release info"));
        assert!(text.contains("testing-repo-0.0.0.tgz"));
        assert!(text.contains("package.json"));
    }

    #[test]
    fn test_memory_reporter_records_in_order() {
        let reporter = MemoryReporter::new();
        reporter.report(&ReportEvent::DryRunStarted);
        reporter.report(&ReportEvent::SafeToPublish("pkg".to_string()));
        assert_eq!(reporter.events().len(), 2);
        assert_eq!(
            reporter.text(),
            "=== dry mode activated ===\npkg is safe to be published."
        );
    }

    #[test]
    fn test_ci_detection() {
        let ctx = InvocationContext::empty();
        assert!(!is_ci(false, &ctx, &EnvSnapshot::default()));
        assert!(is_ci(true, &ctx, &EnvSnapshot::default()));
        assert!(is_ci(false, &ctx, &EnvSnapshot::default().with("CI", "true")));
        assert!(!is_ci(false, &ctx, &EnvSnapshot::default().with("CI", "false")));
        let ci_ctx = InvocationContext {
            ci: true,
            ..InvocationContext::empty()
        };
        assert!(is_ci(false, &ci_ctx, &EnvSnapshot::default()));
    }
}
