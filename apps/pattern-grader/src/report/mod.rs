//! # Reporter
//!
//! Renders a [`GradeResult`] for people: the `results.pass` / `results.fail`
//! report file, the console summary, and the JSON form.
//!
//! Exactly one report file exists in the output directory after a write;
//! whichever of the two a previous run left behind is removed first.

use pattern_grader_core::{GradeError, GradeResult};
use std::path::{Path, PathBuf};

/// Report file name for a passing run.
pub const PASS_FILE: &str = "results.pass";

/// Report file name for a failing run.
pub const FAIL_FILE: &str = "results.fail";

/// Failures listed in the report summary.
const SUMMARY_FAILURES: usize = 5;

/// Failures listed in the console summary.
const CONSOLE_ISSUES: usize = 3;

const RULE: &str = "=====================================";
const THIN_RULE: &str = "-------------------------------------";

// =============================================================================
// REPORT CONTEXT
// =============================================================================

/// What was graded, printed in the report header.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub namespace: String,
    pub category: String,
}

impl ReportHeader {
    pub fn new(namespace: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            category: category.into(),
        }
    }
}

// =============================================================================
// FILE OUTPUT
// =============================================================================

/// Name of the report file for this result.
#[must_use]
pub fn report_file_name(result: &GradeResult) -> &'static str {
    if result.passed() { PASS_FILE } else { FAIL_FILE }
}

/// Write the report into `dir`, creating it if needed, and return its path.
pub fn write_report(
    dir: &Path,
    header: &ReportHeader,
    result: &GradeResult,
) -> Result<PathBuf, GradeError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        GradeError::Io(format!("Cannot create output directory '{}': {}", dir.display(), e))
    })?;
    remove_stale_reports(dir);

    let path = dir.join(report_file_name(result));
    std::fs::write(&path, render_report(header, result))
        .map_err(|e| GradeError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), passed = result.passed(), "Report written");
    Ok(path)
}

/// Remove both report files; a file that cannot be removed is only logged.
fn remove_stale_reports(dir: &Path) {
    for name in [PASS_FILE, FAIL_FILE] {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed stale report"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not remove stale report");
            }
        }
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Full report text.
#[must_use]
pub fn render_report(header: &ReportHeader, result: &GradeResult) -> String {
    let mut out = String::new();
    let status = if result.passed() { "PASS" } else { "FAIL" };

    out.push_str(&format!("{RULE}\nDesign Pattern Grading Result\n{RULE}\n"));
    out.push_str(&format!("Namespace: {}\n", header.namespace));
    out.push_str(&format!("Category: {}\n", header.category));
    out.push_str(&format!("Status: {status}\n"));
    out.push_str(&format!("Score: {}\n", result.score_display()));
    out.push_str(&format!(
        "Tests: {}/{} passed\n",
        result.passed_count(),
        result.total()
    ));
    out.push_str(&format!(
        "Points: {}/{}\n",
        result.total_points(),
        result.max_points()
    ));
    out.push_str(&format!("Elapsed: {} ms\n\n", result.elapsed_ms()));

    let failures: Vec<&str> = result.failures().map(|e| e.message.as_str()).collect();
    let successes: Vec<&str> = result.successes().map(|e| e.message.as_str()).collect();

    if result.passed() {
        out.push_str("CONGRATULATIONS!\n");
        out.push_str("Your implementation demonstrates every checked pattern.\n\n");
    } else {
        out.push_str("IMPROVEMENTS NEEDED\n");
        out.push_str("Your implementation needs attention in the following areas:\n");
        for failure in failures.iter().take(SUMMARY_FAILURES) {
            out.push_str(&format!("* {failure}\n"));
        }
        if failures.len() > SUMMARY_FAILURES {
            out.push_str(&format!(
                "* ... and {} more issues (see details below)\n",
                failures.len() - SUMMARY_FAILURES
            ));
        }
        out.push('\n');
    }

    if !successes.is_empty() {
        out.push_str(&format!("SUCCESSFUL IMPLEMENTATIONS:\n{THIN_RULE}\n"));
        for success in &successes {
            out.push_str(&format!("[PASS] {success}\n"));
        }
        out.push('\n');
    }

    if !failures.is_empty() {
        out.push_str(&format!("ISSUES TO ADDRESS:\n{THIN_RULE}\n"));
        for failure in &failures {
            out.push_str(&format!("[FAIL] {failure}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!("DETAILED GRADING LOG:\n{THIN_RULE}\n"));
    for detail in result.details() {
        out.push_str(detail);
        out.push('\n');
    }
    out.push('\n');

    if !result.passed() {
        out.push_str(&format!("IMPROVEMENT SUGGESTIONS:\n{THIN_RULE}\n"));
        for suggestion in suggestions(result) {
            out.push_str(&format!("* {suggestion}\n"));
        }
        out.push('\n');
    }

    out.push_str(&format!("{RULE}\nEnd of Grading Report\n{RULE}\n"));
    out
}

/// Keyword rules mapping failure wording to advice, checked in order.
const SUGGESTION_RULES: &[(&[&str], &str)] = &[
    (
        &["interface"],
        "Declare the capability interface with its common members",
    ),
    (
        &["factory", "creat"],
        "Give the factory a creation member that takes a type token and returns the capability",
    ),
    (
        &["private constructor"],
        "Close the single-instance type's constructor to prevent outside construction",
    ),
    (
        &["static accessor"],
        "Add exactly one static accessor that returns the single instance",
    ),
    (
        &["thread", "safe"],
        "Make the single instance's lazy creation safe under concurrent first access",
    ),
    (
        &["implementations"],
        "Provide at least three concrete implementations of the capability",
    ),
    (
        &["beyond instance management"],
        "Keep business members on the single-instance type, separate from instance management",
    ),
    (
        &["unknown"],
        "Handle unsupported type tokens by returning nothing or raising an error",
    ),
    (
        &["observer"],
        "Let the publisher add, remove and notify observers through the observer interface",
    ),
    (
        &["command"],
        "Have the invoker execute commands, undo the last one, and keep a history",
    ),
];

/// Advice for the failures in `result`; generic advice when no rule matches.
#[must_use]
pub fn suggestions(result: &GradeResult) -> Vec<&'static str> {
    let messages: Vec<String> = result
        .failures()
        .map(|entry| entry.message.to_lowercase())
        .collect();

    let matched: Vec<&'static str> = SUGGESTION_RULES
        .iter()
        .filter(|(keywords, _)| {
            messages
                .iter()
                .any(|message| keywords.iter().all(|keyword| message.contains(keyword)))
        })
        .map(|(_, advice)| *advice)
        .collect();

    if matched.is_empty() {
        return vec![
            "Review the failed items above against the pattern descriptions",
            "Check that every required type is published under the expected name",
        ];
    }
    matched
}

/// Short console summary.
#[must_use]
pub fn render_summary(result: &GradeResult) -> String {
    let bar = "=".repeat(50);
    let mut out = format!("\n{bar}\nGRADING SUMMARY\n{bar}\n");
    out.push_str(&format!(
        "Status: {}\n",
        if result.passed() { "PASS" } else { "FAIL" }
    ));
    out.push_str(&format!("Score: {}\n", result.score_display()));
    out.push_str(&format!(
        "Tests: {}/{} passed\n",
        result.passed_count(),
        result.total()
    ));

    let failures: Vec<&str> = result.failures().map(|e| e.message.as_str()).collect();
    if !failures.is_empty() {
        out.push_str("\nKey Issues:\n");
        for failure in failures.iter().take(CONSOLE_ISSUES) {
            out.push_str(&format!("* {failure}\n"));
        }
        if failures.len() > CONSOLE_ISSUES {
            out.push_str(&format!(
                "* ... and {} more issues\n",
                failures.len() - CONSOLE_ISSUES
            ));
        }
    }
    out.push_str(&bar);
    out
}

/// The result as pretty JSON.
pub fn render_json(header: &ReportHeader, result: &GradeResult) -> Result<String, GradeError> {
    let output = serde_json::json!({
        "namespace": header.namespace,
        "category": header.category,
        "passed": result.passed(),
        "score_tenths": result.score_tenths(),
        "score": result.score_display(),
        "result": result,
    });
    serde_json::to_string_pretty(&output)
        .map_err(|e| GradeError::Io(format!("Cannot serialize result: {}", e)))
}
