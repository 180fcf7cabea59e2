//! # Verification Stages
//!
//! A stage is one link of the grading chain: a checklist plus its label.
//!
//! ## Stage Definitions
//!
//! | Stage | Label | Items |
//! |-------|-------|-------|
//! | Base | Basic Validation | 0 (detail note only) |
//! | Factory | Factory Pattern | 5 |
//! | Singleton | Singleton Pattern | 6 |
//! | Observer | Observer Pattern | 5 |
//! | Command | Command Pattern | 4 |
//! | Integration | Integration Tests | 5 |
//!
//! ## Failure Boundary
//!
//! Items already turn probe errors into failed entries. Anything that still
//! escapes a checklist (a panic outside a guarded probe) is caught here and
//! recorded as one generic failed item for the stage.

use crate::checklist::{self, CheckItem, Checklist, ProbeContext};
use crate::prober::panic_message;
use crate::result::{CheckEntry, GradeResult};
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};

// =============================================================================
// STAGE KIND
// =============================================================================

/// The pattern areas, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Base,
    Factory,
    Singleton,
    Observer,
    Command,
    Integration,
}

impl StageKind {
    /// Every stage, in chain order.
    pub const ALL: [StageKind; 6] = [
        StageKind::Base,
        StageKind::Factory,
        StageKind::Singleton,
        StageKind::Observer,
        StageKind::Command,
        StageKind::Integration,
    ];

    /// Category label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Base => BASE_LABEL,
            StageKind::Factory => checklist::factory::LABEL,
            StageKind::Singleton => checklist::singleton::LABEL,
            StageKind::Observer => checklist::observer::LABEL,
            StageKind::Command => checklist::command::LABEL,
            StageKind::Integration => checklist::integration::LABEL,
        }
    }

    /// The checklist this stage runs.
    #[must_use]
    pub fn checklist(&self) -> Checklist {
        match self {
            StageKind::Base => Checklist::new(BASE_LABEL, Vec::<CheckItem>::new()),
            StageKind::Factory => checklist::factory::checklist(),
            StageKind::Singleton => checklist::singleton::checklist(),
            StageKind::Observer => checklist::observer::checklist(),
            StageKind::Command => checklist::command::checklist(),
            StageKind::Integration => checklist::integration::checklist(),
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Label of the base stage.
pub const BASE_LABEL: &str = "Basic Validation";

// =============================================================================
// STAGE
// =============================================================================

/// One link of the grading chain.
#[derive(Debug, Clone)]
pub struct Stage {
    kind: StageKind,
    checklist: Checklist,
}

impl Stage {
    #[must_use]
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            checklist: kind.checklist(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_checklist(kind: StageKind, checklist: Checklist) -> Self {
        Self { kind, checklist }
    }

    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Scored items this stage contributes per run.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.checklist.len()
    }

    /// Run this stage's own checklist.
    pub fn run(&self, ctx: &ProbeContext<'_>) -> GradeResult {
        tracing::debug!(stage = self.label(), items = self.item_count(), "Stage starting");

        if self.kind == StageKind::Base {
            let mut result = GradeResult::new();
            result.add_detail(format!(
                "Starting grading for namespace {} ({} types published)",
                ctx.prober.namespace(),
                ctx.prober.manifest().len()
            ));
            return result;
        }

        let mut banner = GradeResult::new();
        banner.add_detail(format!("Starting {} validation", self.label()));

        let own = match catch_unwind(AssertUnwindSafe(|| self.checklist.run(ctx))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(stage = self.label(), %message, "Stage aborted unexpectedly");
                let mut aborted = GradeResult::new();
                aborted.record(CheckEntry::fail(
                    self.label(),
                    format!("{} validation failed unexpectedly: {message}", self.label()),
                    1,
                ));
                aborted
            }
        };

        let result = GradeResult::merge(banner, own);
        tracing::info!(
            stage = self.label(),
            passed = result.passed_count(),
            failed = result.failed_count(),
            "Stage finished"
        );
        result
    }
}

// =============================================================================
// TESTS
// =============================================================================
