//! # Member Predicates
//!
//! Pluggable rules for [`Prober::find_member`](crate::Prober::find_member).
//!
//! The name heuristics used by the checklists are deliberately permissive:
//! names match case-insensitively by substring, and return types match when
//! one type name contains the other.

use crate::manifest::{MemberDescriptor, VOID};

/// A rule that selects members.
pub trait MemberPredicate {
    fn matches(&self, member: &MemberDescriptor) -> bool;

    /// Human-readable description used in "not found" messages.
    fn describe(&self) -> String;
}

/// A labelled closure predicate. Build one with [`matcher`].
pub struct Matcher<F> {
    label: String,
    test: F,
}

/// Wrap a closure as a [`MemberPredicate`].
pub fn matcher<F>(label: impl Into<String>, test: F) -> Matcher<F>
where
    F: Fn(&MemberDescriptor) -> bool,
{
    Matcher {
        label: label.into(),
        test,
    }
}

impl<F> MemberPredicate for Matcher<F>
where
    F: Fn(&MemberDescriptor) -> bool,
{
    fn matches(&self, member: &MemberDescriptor) -> bool {
        (self.test)(member)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// =============================================================================
// NAME RULES
// =============================================================================

/// Case-insensitive substring test.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Member name contains any of the fragments, ignoring case.
#[must_use]
pub fn name_contains_any(member: &MemberDescriptor, fragments: &[impl AsRef<str>]) -> bool {
    fragments
        .iter()
        .any(|fragment| contains_ignore_case(&member.name, fragment.as_ref()))
}

/// Member name equals `name`, ignoring case.
#[must_use]
pub fn named(member: &MemberDescriptor, name: &str) -> bool {
    member.name.eq_ignore_ascii_case(name)
}

/// Return type loosely names `type_name`: either name contains the other.
#[must_use]
pub fn returns_loosely(member: &MemberDescriptor, type_name: &str) -> bool {
    !member.returns.is_empty()
        && (contains_ignore_case(&member.returns, type_name)
            || contains_ignore_case(type_name, &member.returns))
}

#[must_use]
pub fn has_arity(member: &MemberDescriptor, arity: usize) -> bool {
    member.arity() == arity
}

/// Returns something other than `void`.
#[must_use]
pub fn returns_value(member: &MemberDescriptor) -> bool {
    !member.returns.eq_ignore_ascii_case(VOID)
}

/// Zero-argument, non-static member returning a value.
#[must_use]
pub fn is_accessor(member: &MemberDescriptor) -> bool {
    !member.is_static && has_arity(member, 0) && returns_value(member)
}

// =============================================================================
// TESTS
// =============================================================================
