//! # Singleton Checklist
//!
//! Verifies the single-instance lifecycle: a closed constructor, one static
//! accessor, identical instances from sequential and concurrent calls, and
//! behavior beyond instance management.

use super::{CheckItem, Checklist, ProbeContext, Verdict};
use crate::concurrency::{ConcurrencyOutcome, ConcurrencyProbe};
use crate::manifest::MemberDescriptor;
use crate::predicates::matcher;
use crate::prober::MemberHandle;
use crate::types::ProbeError;

pub const LABEL: &str = "Singleton Pattern";

/// The six singleton items, in order.
pub fn checklist() -> Checklist {
    Checklist::new(
        LABEL,
        vec![
            CheckItem::new("Target type", target_exists),
            CheckItem::new("Closed constructor", closed_constructor),
            CheckItem::new("Static accessor", static_accessor),
            CheckItem::new("Sequential identity", sequential_identity),
            CheckItem::new("Concurrent identity", concurrent_identity),
            CheckItem::new("Own behavior", own_behavior),
        ],
    )
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Static, parameterless, reachable, and returns the target type itself.
#[must_use]
pub fn is_static_accessor(member: &MemberDescriptor, target: &str) -> bool {
    member.is_static
        && member.arity() == 0
        && member.visibility.is_accessible()
        && member.returns == target
}

/// A declared member that is neither the accessor nor a platform default.
#[must_use]
pub fn is_own_behavior(member: &MemberDescriptor, target: &str, defaults: &[String]) -> bool {
    !member.inherited
        && !is_static_accessor(member, target)
        && !defaults.iter().any(|name| *name == member.name)
}

/// The target's static accessor, or why there is none.
pub(crate) fn accessor<'a>(ctx: &ProbeContext<'a>) -> Result<MemberHandle<'a>, ProbeError> {
    let target = ctx.config.singleton.target.as_str();
    let handle = ctx.prober.resolve_type(target)?;
    ctx.prober.require_member(
        handle,
        &matcher(format!("a static zero-argument accessor returning {target}"), |m| {
            is_static_accessor(m, target)
        }),
    )
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item 1: the target type exists.
pub fn target_exists(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let handle = ctx.prober.resolve_type(&ctx.config.singleton.target)?;
    Ok(Verdict::pass(format!("{} exists", handle.name())))
}

/// Item 2: at least one constructor is not public.
pub fn closed_constructor(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let target = &ctx.config.singleton.target;
    let handle = ctx.prober.resolve_type(target)?;
    let closed = handle
        .constructors()
        .iter()
        .any(|ctor| !ctor.visibility.is_public());

    Ok(Verdict::check(
        closed,
        format!("{target} has a non-public constructor"),
        format!("{target} should have a private constructor to prevent external instantiation"),
    ))
}

/// Item 3: exactly one static accessor.
pub fn static_accessor(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let target = ctx.config.singleton.target.as_str();
    let handle = ctx.prober.resolve_type(target)?;
    let accessors = ctx.prober.find_members(
        handle,
        &matcher("static accessor", |m| is_static_accessor(m, target)),
    );

    Ok(match accessors.as_slice() {
        [only] => Verdict::pass(format!("{target} has static accessor {}()", only.name())),
        [] => Verdict::fail(format!(
            "{target} should have a static accessor that returns the {target} instance"
        )),
        many => Verdict::fail(format!(
            "{target} should have exactly one static accessor, found {}",
            many.len()
        ))
        .with_detail(format!(
            "Accessors: {}",
            many.iter().map(|m| m.name()).collect::<Vec<_>>().join(", ")
        )),
    })
}

/// Item 4: two sequential calls return the identical instance.
pub fn sequential_identity(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let member = accessor(ctx)?;
    let first = ctx.prober.invoke(None, member, &[])?;
    let second = ctx.prober.invoke(None, member, &[])?;

    let same = match (first.as_instance(), second.as_instance()) {
        (Some(a), Some(b)) => a.same_instance(b),
        _ => false,
    };
    Ok(Verdict::check(
        same,
        format!("{}() returns the same instance", member.name()),
        format!("{}() should always return the same instance", member.name()),
    ))
}

/// Item 5: concurrent callers all receive one instance within the bound.
pub fn concurrent_identity(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.singleton;
    let member = accessor(ctx)?;
    let shared = ctx.prober.shared_accessor(member)?;
    let outcome = ConcurrencyProbe::new(cfg.callers, cfg.timeout_ms).run(&shared);

    if let ConcurrencyOutcome::TimedOut {
        completed,
        callers,
        timeout_ms,
    } = outcome
    {
        return Err(ProbeError::Timeout {
            operation: format!(
                "Thread-safety check of {}() (inconclusive, {completed} of {callers} callers finished)",
                member.name()
            ),
            timeout_ms,
        });
    }

    Ok(if outcome.is_consistent() {
        Verdict::pass(format!(
            "Single instance is thread-safe (one instance across {} concurrent callers)",
            cfg.callers
        ))
    } else {
        Verdict::fail(format!("Single instance is not thread-safe: {outcome}"))
    })
}

/// Item 6: at least one member beyond the accessor and platform defaults.
pub fn own_behavior(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.singleton;
    let handle = ctx.prober.resolve_type(&cfg.target)?;
    let target = cfg.target.as_str();
    let members = ctx.prober.find_members(
        handle,
        &matcher("own behavior", |m| {
            is_own_behavior(m, target, &cfg.default_members)
        }),
    );

    if members.is_empty() {
        return Ok(Verdict::fail(format!(
            "{target} should have members beyond instance management"
        )));
    }
    let names: Vec<_> = members.iter().map(|m| m.name()).collect();
    Ok(
        Verdict::pass(format!("{target} has behavior separated from instance management"))
            .with_detail(format!("Business members found: {}", names.join(", "))),
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ParamKind, Visibility};

    #[test]
    fn accessor_shape() {
        let good = MemberDescriptor::static_method("getInstance").returns("NodeManager");
        assert!(is_static_accessor(&good, "NodeManager"));

        let instance_level = MemberDescriptor::method("getInstance").returns("NodeManager");
        let with_param = good.clone().param(ParamKind::Text);
        let hidden = good.clone().visibility(Visibility::Private);
        let wrong_type = MemberDescriptor::static_method("getInstance").returns("Object");
        assert!(!is_static_accessor(&instance_level, "NodeManager"));
        assert!(!is_static_accessor(&with_param, "NodeManager"));
        assert!(!is_static_accessor(&hidden, "NodeManager"));
        assert!(!is_static_accessor(&wrong_type, "NodeManager"));
    }

    #[test]
    fn own_behavior_excludes_defaults() {
        let defaults = vec!["toString".to_string(), "hashCode".to_string()];
        let accessor = MemberDescriptor::static_method("getInstance").returns("NodeManager");
        let to_string = MemberDescriptor::method("toString").returns("String");
        let inherited = MemberDescriptor::method("clone").inherited();
        let add_node = MemberDescriptor::method("addNode").param(ParamKind::Text);

        assert!(!is_own_behavior(&accessor, "NodeManager", &defaults));
        assert!(!is_own_behavior(&to_string, "NodeManager", &defaults));
        assert!(!is_own_behavior(&inherited, "NodeManager", &defaults));
        assert!(is_own_behavior(&add_node, "NodeManager", &defaults));
    }

    #[test]
    fn concurrency_timeout_is_a_timeout_failure() {
        use crate::config::GradingConfig;
        use crate::manifest::{Manifest, TypeDescriptor};
        use crate::prober::Prober;
        use crate::types::{Instance, Value};
        use std::sync::Arc;
        use std::time::Duration;

        let manifest = Manifest::new("demo").with_type(
            TypeDescriptor::class("NodeManager").member(
                MemberDescriptor::static_method("getInstance")
                    .returns("NodeManager")
                    .body(|_, _| {
                        std::thread::sleep(Duration::from_millis(500));
                        Ok(Value::Object(Instance::new("NodeManager", ())))
                    }),
            ),
        );
        let prober = Prober::new(Arc::new(manifest));
        let mut config = GradingConfig::default();
        config.singleton.callers = 4;
        config.singleton.timeout_ms = 20;
        let ctx = ProbeContext::new(&prober, &config);

        let err = concurrent_identity(&ctx).unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { timeout_ms: 20, .. }));
        assert!(err.to_string().contains("inconclusive"));

        let result = checklist().run(&ctx);
        assert_eq!(result.total(), 6);
        assert!(!result.entries()[4].is_pass());
    }

    #[test]
    fn checklist_has_six_items() {
        assert_eq!(checklist().len(), 6);
    }
}
