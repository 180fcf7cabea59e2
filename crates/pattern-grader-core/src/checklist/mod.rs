//! # Checklists
//!
//! One ordered list of independent verification items per pattern area.
//!
//! An item is a plain function from a [`ProbeContext`] to a [`Verdict`]. Any
//! [`ProbeError`] it returns becomes exactly one failed entry, so items can
//! use `?` on every probe and still never stop the list. Items never share
//! state: each resolves its own prerequisites, and an absent prerequisite
//! fails that item with a "not found" reason.

pub mod command;
pub mod factory;
pub mod integration;
pub mod observer;
pub mod singleton;

use crate::config::GradingConfig;
use crate::prober::Prober;
use crate::result::{CheckEntry, GradeResult};
use crate::types::ProbeError;

// =============================================================================
// VERDICT
// =============================================================================

/// What one item concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    /// Informational notes recorded alongside the entry.
    pub details: Vec<String>,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Pass or fail depending on `passed`.
    pub fn check(passed: bool, on_pass: impl Into<String>, on_fail: impl Into<String>) -> Self {
        if passed {
            Self::pass(on_pass)
        } else {
            Self::fail(on_fail)
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl IntoIterator<Item = String>) -> Self {
        self.details.extend(details);
        self
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// What every item gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    pub prober: &'a Prober,
    pub config: &'a GradingConfig,
}

impl<'a> ProbeContext<'a> {
    pub fn new(prober: &'a Prober, config: &'a GradingConfig) -> Self {
        Self { prober, config }
    }
}

/// Signature of an item's probe sequence.
pub type CheckFn = fn(&ProbeContext<'_>) -> Result<Verdict, ProbeError>;

/// One named, weighted verification item.
#[derive(Debug, Clone, Copy)]
pub struct CheckItem {
    pub name: &'static str,
    pub weight: u32,
    pub check: CheckFn,
}

impl CheckItem {
    /// An item of weight 1.
    pub const fn new(name: &'static str, check: CheckFn) -> Self {
        Self {
            name,
            weight: 1,
            check,
        }
    }
}

// =============================================================================
// CHECKLIST
// =============================================================================

/// An ordered list of items for one pattern area.
#[derive(Debug, Clone)]
pub struct Checklist {
    pub label: &'static str,
    pub items: Vec<CheckItem>,
}

impl Checklist {
    pub fn new(label: &'static str, items: Vec<CheckItem>) -> Self {
        Self { label, items }
    }

    /// Number of scored items this list records per run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run every item in order. Always records exactly `len()` entries.
    pub fn run(&self, ctx: &ProbeContext<'_>) -> GradeResult {
        let mut result = GradeResult::new();

        for item in &self.items {
            match (item.check)(ctx) {
                Ok(verdict) => {
                    tracing::debug!(
                        checklist = self.label,
                        item = item.name,
                        passed = verdict.passed,
                        "Check finished"
                    );
                    let entry = if verdict.passed {
                        CheckEntry::pass(self.label, verdict.message, item.weight)
                    } else {
                        CheckEntry::fail(self.label, verdict.message, item.weight)
                    };
                    result.record(entry);
                    for detail in verdict.details {
                        result.add_detail(detail);
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        checklist = self.label,
                        item = item.name,
                        error = %err,
                        "Check failed with probe error"
                    );
                    result.record(CheckEntry::fail(
                        self.label,
                        format!("{}: {err}", item.name),
                        item.weight,
                    ));
                }
            }
        }

        result
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use std::sync::Arc;

    fn passes(_: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
        Ok(Verdict::pass("fine").with_detail("note"))
    }

    fn errors(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
        ctx.prober.resolve_type("Missing")?;
        Ok(Verdict::pass("unreachable"))
    }

    #[test]
    fn probe_errors_become_single_failed_entries() {
        let prober = Prober::new(Arc::new(Manifest::new("empty")));
        let config = GradingConfig::default();
        let ctx = ProbeContext::new(&prober, &config);
        let checklist = Checklist::new(
            "Demo",
            vec![
                CheckItem::new("Missing type", errors),
                CheckItem::new("Always", passes),
            ],
        );

        let result = checklist.run(&ctx);
        assert_eq!(result.total(), checklist.len());
        assert_eq!(result.failed_count(), 1);
        assert_eq!(
            result.entries()[0].message,
            "Missing type: Missing not found in namespace empty"
        );
        assert!(result.entries()[1].is_pass());
        assert_eq!(result.details(), ["note"]);
    }
}
