//! # Integration Checklist
//!
//! Cross-pattern checks: the single instance and the factory working in one
//! run, extensibility, an end-to-end usage scenario, observer registration,
//! and overall completeness of the behavioral patterns.

use super::factory::{FactoryRig, find_implementations, is_product};
use super::observer::{construct_observer, is_subscribe_member};
use super::{CheckItem, Checklist, ProbeContext, Verdict, singleton};
use crate::manifest::MemberDescriptor;
use crate::predicates::{matcher, named};
use crate::types::{ParamKind, ProbeError, Value};
use std::collections::BTreeSet;

pub const LABEL: &str = "Integration Tests";

/// The five integration items, in order.
pub fn checklist() -> Checklist {
    Checklist::new(
        LABEL,
        vec![
            CheckItem::new("Singleton and factory together", singleton_and_factory),
            CheckItem::new("Extensibility", extensibility),
            CheckItem::new("Usage scenario", usage_scenario),
            CheckItem::new("Observer registration", observer_registration),
            CheckItem::new("Pattern completeness", pattern_completeness),
        ],
    )
}

// =============================================================================
// PREDICATES
// =============================================================================

/// A product member that takes one text input and has one of the given names.
#[must_use]
pub fn is_process_member(member: &MemberDescriptor, name: &str) -> bool {
    named(member, name) && member.params == [ParamKind::Text]
}

/// Any public instance member turning one text input into text, other than
/// `toString`.
#[must_use]
pub fn is_text_transform(member: &MemberDescriptor) -> bool {
    !member.is_static
        && member.visibility.is_public()
        && member.params == [ParamKind::Text]
        && member.returns == "String"
        && member.name != "toString"
}

/// Subscriber registration member taking exactly the observer.
#[must_use]
pub fn is_registration_member(member: &MemberDescriptor, names: &[String]) -> bool {
    !member.inherited && member.arity() == 1 && is_subscribe_member(member, names)
}

/// Percentage of `present` out of `total`, rounded down; zero when empty.
#[must_use]
pub fn completion_percent(present: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (present.saturating_mul(100) / total) as u32
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item 1: singleton accessor and factory both yield instances in one run.
pub fn singleton_and_factory(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let member = singleton::accessor(ctx)?;
    let single = ctx.prober.invoke(None, member, &[])?;

    let rig = FactoryRig::open(ctx)?;
    let capability = ctx.prober.resolve_type(&ctx.config.factory.capability)?;
    let token = ctx
        .config
        .integration
        .tokens
        .first()
        .or_else(|| ctx.config.factory.tokens.first())
        .map(String::as_str)
        .unwrap_or_default();
    let product = rig.create(ctx, token)?;

    if single.as_instance().is_some() && is_product(ctx, capability, &product) {
        return Ok(
            Verdict::pass("Factory and single-instance patterns work together").with_detail(
                format!(
                    "Integrated {} with {}",
                    ctx.config.singleton.target, ctx.config.factory.factory
                ),
            ),
        );
    }
    Ok(Verdict::fail(format!(
        "Integration failed: could not obtain both a {} and a {} instance",
        ctx.config.singleton.target, ctx.config.factory.capability
    )))
}

/// Item 2: enough distinctly named implementations of the capability.
pub fn extensibility(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.factory;
    let capability = ctx.prober.resolve_type(&cfg.capability)?;
    let (valid, _) = find_implementations(ctx, capability);
    let distinct: BTreeSet<&str> = valid.iter().map(String::as_str).collect();

    Ok(Verdict::check(
        distinct.len() >= cfg.min_implementations,
        format!(
            "System shows good extensibility with {} distinct {} implementations",
            distinct.len(),
            cfg.capability
        ),
        format!(
            "System needs better extensibility: at least {} {} types required, found {}",
            cfg.min_implementations,
            cfg.capability,
            distinct.len()
        ),
    ))
}

/// Item 3: tokens driven through factory products with text input.
pub fn usage_scenario(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.integration;
    let rig = FactoryRig::open(ctx)?;

    let mut completed = 0_usize;
    let mut results = Vec::new();
    let mut notes = Vec::new();

    for (token, input) in cfg.tokens.iter().zip(&cfg.inputs) {
        match run_task(ctx, &rig, token, input) {
            Ok(value) if value.is_present() => {
                completed += 1;
                results.push(format!("{token}: {value}"));
            }
            Ok(value) => notes.push(format!("Task {token} produced {value}")),
            Err(err) => notes.push(format!("Task {token} failed: {err}")),
        }
    }

    let total = cfg.tokens.len();
    let verdict = if completed >= cfg.min_completed {
        Verdict::pass(format!(
            "Usage scenario successful ({completed}/{total} tasks completed)"
        ))
        .with_detail(format!("Task results: {}", results.join(", ")))
    } else {
        Verdict::fail(format!(
            "Usage scenario failed: only {completed} of {total} tasks completed"
        ))
    };
    Ok(verdict.with_details(notes))
}

/// Create a product for `token` and hand it `input`.
fn run_task(
    ctx: &ProbeContext<'_>,
    rig: &FactoryRig<'_>,
    token: &str,
    input: &str,
) -> Result<Value, ProbeError> {
    let capability = ctx.prober.resolve_type(&ctx.config.factory.capability)?;
    let created = rig.create(ctx, token)?;
    if !is_product(ctx, capability, &created) {
        return Err(ProbeError::InvocationFailure {
            member: rig.method.label(),
            reason: format!("no {} for token {token}, got {created}", capability.name()),
        });
    }
    let Some(product) = created.into_instance() else {
        return Err(ProbeError::InvocationFailure {
            member: rig.method.label(),
            reason: format!("no product for token {token}"),
        });
    };
    let product_type = ctx.prober.resolve_type(product.type_name())?;

    let process_names = &ctx.config.integration.process_names;
    let member = process_names
        .iter()
        .find_map(|name| {
            ctx.prober
                .find_member(product_type, &matcher(name.as_str(), |m| is_process_member(m, name)))
        })
        .or_else(|| {
            ctx.prober
                .find_member(product_type, &matcher("text transform", is_text_transform))
        })
        .ok_or_else(|| ProbeError::MemberNotFound {
            type_name: product_type.name().to_string(),
            description: format!(
                "a processing member ({}, or any text-to-text member)",
                process_names.join(", ")
            ),
        })?;

    ctx.prober
        .invoke(Some(&product), member, &[Value::Text(input.to_string())])
}

/// Item 4: a publisher accepts an observer through its registration member.
pub fn observer_registration(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.observer;
    let publisher_type = ctx.prober.resolve_type(&cfg.publisher)?;
    let names = &cfg.subscribe_names;
    let Some(register) = ctx.prober.find_member(
        publisher_type,
        &matcher("registration member", |m| is_registration_member(m, names)),
    ) else {
        return Ok(Verdict::fail("No observer registration member found"));
    };

    let publisher = ctx.prober.instantiate(publisher_type, &[])?;
    let observer = construct_observer(ctx)?;

    Ok(
        match ctx
            .prober
            .invoke(Some(&publisher), register, &[Value::Object(observer)])
        {
            Ok(_) => Verdict::pass("Observer registration works"),
            Err(err) => Verdict::fail(format!("Observer registration failed: {err}")),
        },
    )
}

/// Item 5: enough of the behavioral pattern types are present.
pub fn pattern_completeness(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let observer = &ctx.config.observer;
    let command = &ctx.config.command;

    let mut required: Vec<&str> = vec![
        observer.capability.as_str(),
        observer.event.as_str(),
        observer.publisher.as_str(),
    ];
    required.extend(observer.observers.iter().map(String::as_str));
    required.extend([
        command.capability.as_str(),
        command.concrete.as_str(),
        command.invoker.as_str(),
    ]);

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| ctx.prober.resolve_type(name).is_err())
        .collect();
    let present = required.len() - missing.len();
    let percent = completion_percent(present, required.len());
    let threshold = ctx.config.integration.completeness_percent;

    let summary = format!(
        "Implementation completion: {percent}% ({present}/{} types)",
        required.len()
    );
    let verdict = if percent >= threshold {
        Verdict::pass("Comprehensive behavioral patterns implementation")
    } else {
        Verdict::fail("Incomplete behavioral patterns implementation")
    };
    Ok(verdict
        .with_detail(summary)
        .with_details(missing.into_iter().map(|name| format!("Missing type: {name}"))))
}

// =============================================================================
// TESTS
// =============================================================================
