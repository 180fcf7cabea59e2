//! # Command Checklist
//!
//! Verifies encapsulated actions: a command capability with the four
//! required members, a concrete command taking parameters, an invoker that
//! executes, undoes and remembers, and that a command can be built blind.

use super::{CheckItem, Checklist, ProbeContext, Verdict};
use crate::manifest::MemberDescriptor;
use crate::predicates::{matcher, name_contains_any, named};
use crate::prober::TypeHandle;
use crate::types::{Instance, ParamKind, ProbeError, Value};

pub const LABEL: &str = "Command Pattern";

/// The four command items, in order.
pub fn checklist() -> Checklist {
    Checklist::new(
        LABEL,
        vec![
            CheckItem::new("Command capability", command_capability),
            CheckItem::new("Concrete command", concrete_command),
            CheckItem::new("Invoker members", invoker_members),
            CheckItem::new("Command construction", command_construction),
        ],
    )
}

// =============================================================================
// PREDICATES
// =============================================================================

/// A zero-argument member with exactly this name, ignoring case.
#[must_use]
pub fn is_required_member(member: &MemberDescriptor, name: &str) -> bool {
    named(member, name) && member.arity() == 0
}

/// Invoker member that runs a command handed to it.
#[must_use]
pub fn is_execute_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names) && member.arity() >= 1
}

#[must_use]
pub fn is_undo_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names)
}

/// Invoker member exposing past commands (`getHistory`) or any accessor.
#[must_use]
pub fn is_history_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names)
}

// =============================================================================
// SHARED PROBES
// =============================================================================

/// Synthesized arguments: text `"test"`, zero numbers, `false`, absent objects.
pub(crate) fn synthesized_arguments(params: &[ParamKind]) -> Vec<Value> {
    params.iter().map(ParamKind::synthesized_default).collect()
}

/// Build the concrete command through the first parameterized constructor
/// that accepts synthesized arguments.
pub(crate) fn construct_command(
    ctx: &ProbeContext<'_>,
    concrete: TypeHandle<'_>,
) -> Result<Instance, ProbeError> {
    let mut last_error = ProbeError::NoSuitableConstructor(concrete.name().to_string());
    for ctor in concrete
        .constructors()
        .iter()
        .filter(|ctor| ctor.visibility.is_accessible() && ctor.arity() > 0)
    {
        match ctx
            .prober
            .construct(concrete, ctor, &synthesized_arguments(&ctor.params))
        {
            Ok(instance) => return Ok(instance),
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item 1: capability interface declares the required zero-argument members.
pub fn command_capability(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.command;
    let capability = ctx.prober.require_interface(&cfg.capability)?;

    let missing: Vec<&str> = cfg
        .required_members
        .iter()
        .map(String::as_str)
        .filter(|name| {
            ctx.prober
                .find_member(capability, &matcher(*name, |m| is_required_member(m, name)))
                .is_none()
        })
        .collect();

    let required = cfg
        .required_members
        .iter()
        .map(|name| format!("{name}()"))
        .collect::<Vec<_>>()
        .join(", ");

    if missing.is_empty() {
        return Ok(
            Verdict::pass(format!("{} interface is properly defined", cfg.capability))
                .with_detail(format!("Found required members: {required}")),
        );
    }
    Ok(
        Verdict::fail(format!("{} interface missing required members", cfg.capability))
            .with_detail(format!("Required: {required}"))
            .with_details(missing.iter().map(|name| format!("Missing: {name}()"))),
    )
}

/// Item 2: concrete command implements the capability and takes parameters.
pub fn concrete_command(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.command;
    let concrete = ctx.prober.require_concrete(&cfg.concrete)?;
    let capability = ctx.prober.resolve_type(&cfg.capability)?;

    if !ctx.prober.is_assignable(concrete, capability) {
        return Ok(Verdict::fail(format!(
            "{} does not implement {}",
            cfg.concrete, cfg.capability
        )));
    }

    let parameterized = concrete.constructors().iter().any(|ctor| ctor.arity() > 0);
    Ok(if parameterized {
        Verdict::pass(format!(
            "{} implements {} with a parameterized constructor",
            cfg.concrete, cfg.capability
        ))
    } else {
        Verdict::fail(format!("{} missing parameterized constructor", cfg.concrete))
            .with_detail(format!("{} should accept parameters in its constructor", cfg.concrete))
    })
}

/// Item 3: invoker executes, undoes, and exposes history.
pub fn invoker_members(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.command;
    let invoker = ctx.prober.resolve_type(&cfg.invoker)?;
    let has = |label: &str, rule: &dyn Fn(&MemberDescriptor) -> bool| {
        ctx.prober
            .find_member(invoker, &matcher(label, |m| !m.inherited && rule(m)))
            .is_some()
    };

    let checks = [
        (
            has("execute", &|m| is_execute_member(m, &cfg.execute_names)),
            "execute member taking a command",
        ),
        (has("undo", &|m| is_undo_member(m, &cfg.undo_names)), "undo member"),
        (
            has("history", &|m| is_history_member(m, &cfg.history_names)),
            "history member",
        ),
    ];
    let missing: Vec<&str> = checks
        .iter()
        .filter(|(found, _)| !found)
        .map(|(_, label)| *label)
        .collect();

    if missing.is_empty() {
        return Ok(Verdict::pass(format!(
            "{} manages execution, undo and history",
            cfg.invoker
        )));
    }
    Ok(
        Verdict::fail(format!("{} missing {}", cfg.invoker, missing.join(", ")))
            .with_detail(format!(
                "{} should manage command execution, undo and history",
                cfg.invoker
            )),
    )
}

/// Item 4: invoker and concrete command can be constructed.
pub fn command_construction(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.command;
    let invoker = ctx.prober.resolve_type(&cfg.invoker)?;
    let concrete = ctx.prober.resolve_type(&cfg.concrete)?;

    ctx.prober.instantiate(invoker, &[])?;
    match construct_command(ctx, concrete) {
        Ok(_) => Ok(Verdict::pass("Command pattern participants construct successfully")
            .with_detail(format!(
                "Created {} and {} instances",
                cfg.invoker, cfg.concrete
            ))),
        Err(err) => Ok(
            Verdict::fail(format!("Failed to create {} instance", cfg.concrete))
                .with_detail(format!("{err}"))
                .with_detail(format!(
                    "{} constructor may require specific parameters",
                    cfg.concrete
                )),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_members_are_zero_arg() {
        assert!(is_required_member(&MemberDescriptor::method("execute"), "execute"));
        assert!(is_required_member(&MemberDescriptor::method("Undo"), "undo"));
        assert!(!is_required_member(
            &MemberDescriptor::method("execute").param(ParamKind::Text),
            "execute"
        ));
    }

    #[test]
    fn invoker_rules() {
        let names = vec!["execute".to_string()];
        let takes_command = MemberDescriptor::method("executeCommand")
            .param(ParamKind::Object("Command".into()));
        assert!(is_execute_member(&takes_command, &names));
        assert!(!is_execute_member(&MemberDescriptor::method("execute"), &names));

        let history = vec!["history".to_string(), "get".to_string()];
        assert!(is_history_member(&MemberDescriptor::method("getHistory"), &history));
        assert!(is_history_member(&MemberDescriptor::method("commandHistory"), &history));
        assert!(is_undo_member(
            &MemberDescriptor::method("undoLastCommand"),
            &["undo".to_string()]
        ));
    }

    #[test]
    fn synthesized_arguments_cover_params() {
        let args = synthesized_arguments(&[ParamKind::Text, ParamKind::Integer, ParamKind::Boolean]);
        assert_eq!(args[0].as_text(), Some("test"));
        assert!(matches!(args[1], Value::Integer(0)));
        assert!(matches!(args[2], Value::Boolean(false)));
    }
}
