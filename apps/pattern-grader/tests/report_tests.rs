//! Tests for report output and configuration loading.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use pattern_grader::cli::{load_config, registry};
use pattern_grader::report::{
    FAIL_FILE, PASS_FILE, ReportHeader, render_json, render_report, render_summary, suggestions,
    write_report,
};
use pattern_grader_core::reference::COMPLETE;
use pattern_grader_core::{
    CheckEntry, ChainPreset, GradeError, GradeResult, GradingConfig, MergePolicy, Pipeline,
};
use std::io::Write;

fn result_with(passes: usize, failures: &[&str]) -> GradeResult {
    let mut result = GradeResult::new();
    for i in 0..passes {
        result.record(CheckEntry::pass("Factory Pattern", format!("check {i} ok"), 1));
    }
    for failure in failures {
        result.record(CheckEntry::fail("Singleton Pattern", *failure, 1));
    }
    result.add_detail("Starting Singleton Pattern validation");
    result
}

fn header() -> ReportHeader {
    ReportHeader::new("student.week01", "Basic Validation + Singleton Pattern")
}

// =============================================================================
// REPORT FILE TESTS
// =============================================================================

#[test]
fn test_passing_result_writes_pass_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_report(dir.path(), &header(), &result_with(3, &[])).unwrap();

    assert_eq!(path.file_name().unwrap(), PASS_FILE);
    assert!(!dir.path().join(FAIL_FILE).exists());
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Status: PASS"));
    assert!(text.contains("Score: 100.0%"));
    assert!(!text.contains("IMPROVEMENT SUGGESTIONS"));
}

#[test]
fn test_stale_report_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    write_report(dir.path(), &header(), &result_with(3, &[])).unwrap();
    write_report(dir.path(), &header(), &result_with(1, &["boom"])).unwrap();

    assert!(!dir.path().join(PASS_FILE).exists());
    assert!(dir.path().join(FAIL_FILE).exists());
}

#[test]
fn test_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reports").join("week01");
    let path = write_report(&nested, &header(), &result_with(0, &["boom"])).unwrap();
    assert_eq!(path, nested.join(FAIL_FILE));
}

// =============================================================================
// RENDERING TESTS
// =============================================================================

#[test]
fn test_report_summary_lists_five_failures() {
    let failures = ["f1", "f2", "f3", "f4", "f5", "f6", "f7"];
    let text = render_report(&header(), &result_with(1, &failures));

    assert!(text.contains("Status: FAIL"));
    assert!(text.contains("Tests: 1/8 passed"));
    assert!(text.contains("* f5\n"));
    assert!(!text.contains("* f6\n"));
    assert!(text.contains("* ... and 2 more issues (see details below)"));
    assert!(text.contains("[FAIL] f7"));
    assert!(text.contains("[PASS] check 0 ok"));
    assert!(text.contains("Starting Singleton Pattern validation"));
    assert!(text.ends_with("End of Grading Report\n=====================================\n"));
}

#[test]
fn test_console_summary_lists_three_issues() {
    let text = render_summary(&result_with(0, &["a", "b", "c", "d"]));
    assert!(text.contains("Status: FAIL"));
    assert!(text.contains("* c\n"));
    assert!(!text.contains("* d\n"));
    assert!(text.contains("* ... and 1 more issues"));
}

#[test]
fn test_suggestions_follow_failure_wording() {
    let result = result_with(
        0,
        &[
            "NodeManager should have a private constructor to prevent external instantiation",
            "Single instance is not thread-safe: 2 distinct instances",
        ],
    );
    let advice = suggestions(&result);
    assert_eq!(advice.len(), 2);
    assert!(advice[0].contains("constructor"));
    assert!(advice[1].contains("concurrent"));

    assert_eq!(suggestions(&result_with(0, &["zzz"])).len(), 2);
}

#[test]
fn test_json_carries_result() {
    let json = render_json(&header(), &result_with(2, &["boom"])).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["namespace"], "student.week01");
    assert_eq!(value["passed"], false);
    assert_eq!(value["score_tenths"], 666);
    assert_eq!(value["result"]["entries"].as_array().unwrap().len(), 3);
}

// =============================================================================
// CONFIG TESTS
// =============================================================================

#[test]
fn test_no_config_gives_defaults() {
    assert_eq!(load_config(None).unwrap(), GradingConfig::default());
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
merge_policy = "flag_prior_failure"

[factory]
capability = "Shape"
factory = "ShapeFactory"

[singleton]
callers = 8
"#
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.merge_policy, MergePolicy::FlagPriorFailure);
    assert_eq!(config.factory.capability, "Shape");
    assert_eq!(config.factory.unknown_token, "UNKNOWN_TYPE");
    assert_eq!(config.singleton.callers, 8);
    assert_eq!(config.singleton.target, "NodeManager");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[singleton]\ncallers = 0").unwrap();
    assert!(matches!(
        load_config(Some(file.path())),
        Err(GradeError::Config(_))
    ));

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    writeln!(garbage, "factory = [").unwrap();
    assert!(matches!(
        load_config(Some(garbage.path())),
        Err(GradeError::Config(_))
    ));
}

// =============================================================================
// END-TO-END
// =============================================================================

#[test]
fn test_reference_grading_writes_pass_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GradingConfig::default();
    config.singleton.callers = 8;
    let pipeline = Pipeline::with_preset(config, ChainPreset::Full);
    let result = pipeline.grade_or_terminal(&registry(), COMPLETE);

    let header = ReportHeader::new(COMPLETE, pipeline.category());
    let path = write_report(dir.path(), &header, &result).unwrap();
    assert_eq!(path.file_name().unwrap(), PASS_FILE);
}

#[test]
fn test_unknown_namespace_writes_fail_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(GradingConfig::default());
    let result = pipeline.grade_or_terminal(&registry(), "nobody.week01");

    let path = write_report(dir.path(), &header(), &result).unwrap();
    assert_eq!(path.file_name().unwrap(), FAIL_FILE);
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Grading could not start"));
}
