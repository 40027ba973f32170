use publish_please_core::domain::context::{detect, EnvSnapshot};
use publish_please_core::report::{CiReporter, ElegantReporter, MemoryReporter, Reporter};
use publish_please_core::{evaluate_guard, run_guard, GuardDecision};
use std::io::Write;
use std::sync::{Arc, Mutex};

fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
    pairs.iter().copied().collect()
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

// ---- decisions ----

#[test]
fn publish_without_marker_is_blocked() {
    let ctx = detect(Some(&env(&[("npm_command", "publish")])));
    assert_eq!(evaluate_guard(&ctx), GuardDecision::Blocked);
}

#[test]
fn publish_with_marker_is_allowed() {
    let ctx = detect(Some(&env(&[
        ("npm_command", "publish"),
        ("npm_config_with_publish_please", "true"),
    ])));
    assert_eq!(evaluate_guard(&ctx), GuardDecision::Allowed);
}

#[test]
fn missing_environment_is_blocked() {
    assert_eq!(evaluate_guard(&detect(None)), GuardDecision::Blocked);
}

#[test]
fn marker_with_non_sentinel_value_is_blocked() {
    let ctx = detect(Some(&env(&[
        ("npm_command", "publish"),
        ("npm_config_with_publish_please", "yes"),
    ])));
    assert_eq!(evaluate_guard(&ctx), GuardDecision::Blocked);
}

// ---- rendering ----

#[test]
fn elegant_rejection_is_coloured() {
    let out = Captured::default();
    let reporter = ElegantReporter::with_writer(Box::new(out.clone()));
    let code = run_guard(&detect(Some(&env(&[("npm_command", "publish")]))), &reporter);
    assert_eq!(code, 1);
    assert!(out.text().contains("'npm publish' is forbidden for this package"));
    assert!(out.text().contains("\u{1b}[31m"));
}

#[test]
fn ci_rejection_is_plain() {
    let out = Captured::default();
    let reporter = CiReporter::with_writer(Box::new(out.clone()));
    let ctx = detect(Some(&env(&[("npm_command", "publish"), ("npm_config_ci", "true")])));
    assert_eq!(run_guard(&ctx, &reporter), 1);
    let text = out.text();
    assert!(text.contains("'npm publish' is forbidden for this package"));
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn allowed_release_prints_no_rejection() {
    let reporter = MemoryReporter::new();
    let ctx = detect(Some(&env(&[
        ("npm_command", "publish"),
        ("npm_config_with_publish_please", "true"),
    ])));
    assert_eq!(run_guard(&ctx, &reporter as &dyn Reporter), 0);
    assert!(!reporter.text().contains("is forbidden for this package"));
}
