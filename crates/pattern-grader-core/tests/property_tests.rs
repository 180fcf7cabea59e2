//! # Property-Based Tests
//!
//! Invariants of the result algebra, checked with proptest.

use pattern_grader_core::{CheckEntry, GradeResult, MergePolicy};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn entry() -> impl Strategy<Value = CheckEntry> {
    (any::<bool>(), "[a-z ]{1,12}", 1u32..4).prop_map(|(pass, message, weight)| {
        if pass {
            CheckEntry::pass("Stage", message, weight)
        } else {
            CheckEntry::fail("Stage", message, weight)
        }
    })
}

fn result() -> impl Strategy<Value = GradeResult> {
    (vec(entry(), 0..8), vec("[a-z]{1,8}", 0..4), 0u64..500).prop_map(
        |(entries, details, elapsed)| {
            let mut result = GradeResult::new();
            for entry in entries {
                result.record(entry);
            }
            for detail in details {
                result.add_detail(detail);
            }
            result.set_elapsed_ms(elapsed);
            result
        },
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Merging concatenates entries and details in argument order.
    #[test]
    fn merge_concatenates(a in result(), b in result()) {
        let merged = GradeResult::merge(a.clone(), b.clone());

        let expected: Vec<CheckEntry> = a.entries().iter().chain(b.entries()).cloned().collect();
        prop_assert_eq!(merged.entries(), expected.as_slice());
        prop_assert_eq!(merged.details().len(), a.details().len() + b.details().len());
        prop_assert_eq!(merged.elapsed_ms(), a.elapsed_ms() + b.elapsed_ms());
    }

    /// Counts and totals are additive under merge.
    #[test]
    fn counts_are_additive(a in result(), b in result()) {
        let merged = GradeResult::merge(a.clone(), b.clone());

        prop_assert_eq!(merged.total(), a.total() + b.total());
        prop_assert_eq!(merged.passed_count(), a.passed_count() + b.passed_count());
        prop_assert_eq!(merged.passed_count() + merged.failed_count(), merged.total());
        prop_assert_eq!(merged.max_points(), a.max_points() + b.max_points());
    }

    /// Grouping does not matter.
    #[test]
    fn merge_is_associative(a in result(), b in result(), c in result()) {
        let left = GradeResult::merge(GradeResult::merge(a.clone(), b.clone()), c.clone());
        let right = GradeResult::merge(a, GradeResult::merge(b, c));
        prop_assert_eq!(left, right);
    }

    /// Order does: swapping operands swaps the entry order.
    #[test]
    fn merge_keeps_operand_order(a in result(), b in result()) {
        prop_assume!(!a.entries().is_empty() && !b.entries().is_empty());
        prop_assume!(a.entries()[0] != b.entries()[0]);

        let ab = GradeResult::merge(a.clone(), b.clone());
        let ba = GradeResult::merge(b.clone(), a.clone());
        prop_assert_eq!(&ab.entries()[0], &a.entries()[0]);
        prop_assert_eq!(&ba.entries()[0], &b.entries()[0]);
    }

    /// The empty result is the identity.
    #[test]
    fn empty_is_identity(a in result()) {
        prop_assert_eq!(GradeResult::merge(GradeResult::new(), a.clone()), a.clone());
        prop_assert_eq!(GradeResult::merge(a.clone(), GradeResult::new()), a);
    }

    /// Passing needs at least one entry and no failures.
    #[test]
    fn passed_requires_entries_and_no_failures(a in result()) {
        prop_assert_eq!(a.passed(), a.total() > 0 && a.failed_count() == 0);
        prop_assert!(a.score_tenths() <= 1000);
    }

    /// The flag policy adds at most one entry, and only after a failure.
    #[test]
    fn flag_policy_adds_one_entry_after_failure(inner in result(), own in result()) {
        let flagged = MergePolicy::FlagPriorFailure.merge(inner.clone(), own.clone(), "Next");
        let extra = usize::from(inner.failed_count() > 0);

        prop_assert_eq!(flagged.total(), inner.total() + own.total() + extra);
        if extra == 1 {
            prop_assert_eq!(
                flagged.entries()[inner.total()].message.as_str(),
                MergePolicy::PRIOR_FAILURE
            );
        }
        prop_assert_eq!(
            MergePolicy::AppendOnly.merge(inner.clone(), own.clone(), "Next"),
            GradeResult::merge(inner, own)
        );
    }
}
