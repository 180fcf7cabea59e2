//! # Result Model
//!
//! The ordered log a grading run produces and the algebra that combines
//! stage outcomes.
//!
//! ## Invariants
//!
//! - `total() == passed_count() + failed_count()` for every result.
//! - Entry order is insertion order; [`GradeResult::merge`] concatenates and
//!   never reorders, so `merge(a, b)` and `merge(b, a)` differ.
//! - Scores use integer arithmetic only. `score_tenths()` is per-mille
//!   (87.5% is 875); `score_percent()` rounds down.

use crate::types::GradeError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ENTRIES
// =============================================================================

/// Outcome of one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Fail => write!(f, "FAIL"),
        }
    }
}

/// One scored line of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub outcome: Outcome,
    pub message: String,
    /// Label of the stage that recorded the entry.
    pub stage: String,
    /// Points earned: `max_points` on a pass, zero on a fail.
    pub points: u32,
    pub max_points: u32,
}

impl CheckEntry {
    pub fn pass(stage: impl Into<String>, message: impl Into<String>, weight: u32) -> Self {
        Self {
            outcome: Outcome::Pass,
            message: message.into(),
            stage: stage.into(),
            points: weight,
            max_points: weight,
        }
    }

    pub fn fail(stage: impl Into<String>, message: impl Into<String>, weight: u32) -> Self {
        Self {
            outcome: Outcome::Fail,
            message: message.into(),
            stage: stage.into(),
            points: 0,
            max_points: weight,
        }
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

impl fmt::Display for CheckEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.outcome, self.stage, self.message)
    }
}

// =============================================================================
// GRADE RESULT
// =============================================================================

/// Outcome of a grading run (or of one stage of it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    entries: Vec<CheckEntry>,
    /// Informational notes; never scored.
    details: Vec<String>,
    elapsed_ms: u64,
}

impl GradeResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: CheckEntry) {
        self.entries.push(entry);
    }

    /// Append an informational note.
    pub fn add_detail(&mut self, detail: impl Into<String>) {
        self.details.push(detail.into());
    }

    pub fn set_elapsed_ms(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = elapsed_ms;
    }

    #[must_use]
    pub fn entries(&self) -> &[CheckEntry] {
        &self.entries
    }

    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    // -------------------------------------------------------------------------
    // Derived counts
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pass()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Overall verdict: at least one item ran and none failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.total() > 0 && self.failed_count() == 0
    }

    /// Score in tenths of a percent, zero when nothing ran.
    #[must_use]
    pub fn score_tenths(&self) -> u32 {
        let total = self.total() as u64;
        if total == 0 {
            return 0;
        }
        ((self.passed_count() as u64).saturating_mul(1000) / total) as u32
    }

    /// Score in whole percent, rounded down.
    #[must_use]
    pub fn score_percent(&self) -> u32 {
        self.score_tenths() / 10
    }

    /// Score formatted as `87.5%`.
    #[must_use]
    pub fn score_display(&self) -> String {
        let tenths = self.score_tenths();
        format!("{}.{}%", tenths / 10, tenths % 10)
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.entries.iter().map(|e| e.points).sum()
    }

    #[must_use]
    pub fn max_points(&self) -> u32 {
        self.entries.iter().map(|e| e.max_points).sum()
    }

    pub fn successes(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries.iter().filter(|e| e.is_pass())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries.iter().filter(|e| !e.is_pass())
    }

    // -------------------------------------------------------------------------
    // Algebra
    // -------------------------------------------------------------------------

    /// Concatenate two results: `a`'s entries and details, then `b`'s.
    #[must_use]
    pub fn merge(a: GradeResult, b: GradeResult) -> GradeResult {
        let mut merged = a;
        merged.entries.extend(b.entries);
        merged.details.extend(b.details);
        merged.elapsed_ms = merged.elapsed_ms.saturating_add(b.elapsed_ms);
        merged
    }

    /// The result substituted when grading could not start.
    #[must_use]
    pub fn terminal_failure(error: &GradeError) -> GradeResult {
        let mut result = GradeResult::new();
        result.record(CheckEntry::fail(
            "Base",
            format!("Grading could not start: {error}"),
            1,
        ));
        result
    }
}

impl fmt::Display for GradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} checks, {})",
            if self.passed() { "PASSED" } else { "FAILED" },
            self.passed_count(),
            self.total(),
            self.score_display()
        )
    }
}

// =============================================================================
// MERGE POLICY
// =============================================================================

/// How a stage combines its inner result with its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Plain concatenation.
    #[default]
    AppendOnly,
    /// Concatenation, with one synthetic failed entry between the two parts
    /// when the inner result contains a failure.
    FlagPriorFailure,
}

impl MergePolicy {
    /// Message of the synthetic entry.
    pub const PRIOR_FAILURE: &'static str = "previous stage failed";

    #[must_use]
    pub fn merge(self, inner: GradeResult, own: GradeResult, stage: &str) -> GradeResult {
        match self {
            MergePolicy::AppendOnly => GradeResult::merge(inner, own),
            MergePolicy::FlagPriorFailure => {
                let mut inner = inner;
                if inner.failed_count() > 0 {
                    inner.record(CheckEntry::fail(stage, Self::PRIOR_FAILURE, 1));
                }
                GradeResult::merge(inner, own)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(passes: usize, fails: usize, stage: &str) -> GradeResult {
        let mut result = GradeResult::new();
        for i in 0..passes {
            result.record(CheckEntry::pass(stage, format!("pass {i}"), 1));
        }
        for i in 0..fails {
            result.record(CheckEntry::fail(stage, format!("fail {i}"), 1));
        }
        result
    }

    #[test]
    fn empty_result_scores_zero_and_fails() {
        let result = GradeResult::new();
        assert_eq!(result.total(), 0);
        assert_eq!(result.score_tenths(), 0);
        assert!(!result.passed());
    }

    #[test]
    fn score_uses_integer_math() {
        let result = sample(7, 1, "Factory");
        assert_eq!(result.score_tenths(), 875);
        assert_eq!(result.score_percent(), 87);
        assert_eq!(result.score_display(), "87.5%");
        assert!(!result.passed());
    }

    #[test]
    fn all_passing_is_passed() {
        let result = sample(3, 0, "Command");
        assert!(result.passed());
        assert_eq!(result.score_percent(), 100);
        assert_eq!(result.total_points(), 3);
        assert_eq!(result.max_points(), 3);
    }

    #[test]
    fn merge_preserves_order() {
        let mut a = sample(1, 1, "A");
        a.add_detail("a note");
        let mut b = sample(2, 0, "B");
        b.add_detail("b note");

        let merged = GradeResult::merge(a.clone(), b.clone());
        let stages: Vec<_> = merged.entries().iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(stages, vec!["A", "A", "B", "B"]);
        assert_eq!(merged.details(), ["a note", "b note"]);
        assert_ne!(merged, GradeResult::merge(b, a));
    }

    #[test]
    fn flag_policy_injects_on_inner_failure() {
        let merged = MergePolicy::FlagPriorFailure.merge(sample(1, 1, "A"), sample(1, 0, "B"), "B");
        assert_eq!(merged.total(), 4);
        assert_eq!(merged.entries()[2].message, MergePolicy::PRIOR_FAILURE);
        assert_eq!(merged.entries()[2].stage, "B");
        assert_eq!(merged.entries()[3].message, "pass 0");
    }

    #[test]
    fn flag_policy_silent_on_clean_or_empty_inner() {
        let clean = MergePolicy::FlagPriorFailure.merge(sample(2, 0, "A"), sample(1, 0, "B"), "B");
        assert_eq!(clean.total(), 3);
        let empty = MergePolicy::FlagPriorFailure.merge(GradeResult::new(), sample(1, 0, "B"), "B");
        assert_eq!(empty.total(), 1);
    }

    #[test]
    fn terminal_failure_is_one_failed_entry() {
        let result = GradeResult::terminal_failure(&GradeError::NamespaceNotFound("x".into()));
        assert_eq!(result.total(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(result.entries()[0].message.contains("Namespace not found: x"));
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::Pass.to_string(), "PASS");
        assert_eq!(CheckEntry::fail("Base", "oops", 1).to_string(), "[FAIL] Base: oops");
    }
}
