//! # Factory Checklist
//!
//! Verifies creation through a factory: a capability interface, a creator
//! with a creation member, several concrete products, and sane handling of
//! tokens the creator does not know.

use super::{CheckItem, Checklist, ProbeContext, Verdict};
use crate::manifest::MemberDescriptor;
use crate::predicates::{contains_ignore_case, matcher, returns_loosely};
use crate::prober::{MemberHandle, TypeHandle};
use crate::types::{Instance, ParamKind, ProbeError, Value};

pub const LABEL: &str = "Factory Pattern";

/// The five factory items, in order.
pub fn checklist() -> Checklist {
    Checklist::new(
        LABEL,
        vec![
            CheckItem::new("Capability interface", capability_interface),
            CheckItem::new("Factory creation member", factory_creation_member),
            CheckItem::new("Capability implementations", implementations),
            CheckItem::new("Factory products", factory_products),
            CheckItem::new("Unknown token handling", unknown_token),
        ],
    )
}

// =============================================================================
// PREDICATES
// =============================================================================

/// A member that creates products: returns the capability and takes input.
#[must_use]
pub fn is_creation_member(member: &MemberDescriptor, capability: &str) -> bool {
    returns_loosely(member, capability) && member.arity() >= 1
}

/// The member driven with category tokens: one text parameter, and either
/// returns the capability or is named like a creator.
#[must_use]
pub fn is_factory_method(member: &MemberDescriptor, capability: &str) -> bool {
    member.params == [ParamKind::Text]
        && (returns_loosely(member, capability) || contains_ignore_case(&member.name, "create"))
}

// =============================================================================
// SHARED PROBES
// =============================================================================

/// A factory ready to be driven with tokens.
pub(crate) struct FactoryRig<'a> {
    pub method: MemberHandle<'a>,
    /// `None` when the creation member is static.
    pub receiver: Option<Instance>,
}

impl<'a> FactoryRig<'a> {
    /// Resolve the factory, its token-driven member and, if needed, an instance.
    pub fn open(ctx: &ProbeContext<'a>) -> Result<Self, ProbeError> {
        let cfg = &ctx.config.factory;
        let factory = ctx.prober.resolve_type(&cfg.factory)?;
        let capability = cfg.capability.as_str();
        let method = ctx.prober.require_member(
            factory,
            &matcher(
                format!("a creation member taking one text token ({capability})"),
                |m| is_factory_method(m, capability),
            ),
        )?;

        let receiver = if method.is_static() {
            None
        } else {
            Some(ctx.prober.instantiate(factory, &[])?)
        };

        Ok(Self { method, receiver })
    }

    /// Drive the creation member with one token.
    pub fn create(&self, ctx: &ProbeContext<'_>, token: &str) -> Result<Value, ProbeError> {
        ctx.prober.invoke(
            self.receiver.as_ref(),
            self.method,
            &[Value::Text(token.to_string())],
        )
    }
}

/// Candidate names that are concrete, assignable to the capability, and
/// produce a capability-satisfying instance when default-constructed.
///
/// Returns the valid names and one note per candidate that was rejected.
pub(crate) fn find_implementations(
    ctx: &ProbeContext<'_>,
    capability: TypeHandle<'_>,
) -> (Vec<String>, Vec<String>) {
    let mut valid = Vec::new();
    let mut rejected = Vec::new();

    for name in &ctx.config.factory.candidates {
        let Ok(candidate) = ctx.prober.resolve_type(name) else {
            continue;
        };
        if !candidate.kind().is_instantiable() || !ctx.prober.is_assignable(candidate, capability)
        {
            continue;
        }
        match ctx.prober.instantiate(candidate, &[]) {
            Ok(instance) if ctx.prober.is_instance_of(&instance, capability) => {
                if !valid.contains(name) {
                    valid.push(name.clone());
                }
            }
            Ok(instance) => rejected.push(format!(
                "{name} does not properly implement {} (constructed a {})",
                capability.name(),
                instance.type_name()
            )),
            Err(err) => rejected.push(format!("Cannot instantiate {name}: {err}")),
        }
    }

    (valid, rejected)
}

/// Whether a creation result is a product of the capability.
pub(crate) fn is_product(
    ctx: &ProbeContext<'_>,
    capability: TypeHandle<'_>,
    value: &Value,
) -> bool {
    value
        .as_instance()
        .is_some_and(|instance| ctx.prober.is_instance_of(instance, capability))
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item 1: capability exists, is an interface, declares at least one member.
pub fn capability_interface(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let name = &ctx.config.factory.capability;
    let capability = ctx.prober.require_interface(name)?;
    let declared = capability.descriptor().declared_members().count();

    if declared == 0 {
        return Ok(Verdict::fail(format!(
            "{name} interface should have at least one member"
        )));
    }
    Ok(Verdict::pass(format!("{name} interface exists and has members"))
        .with_detail(format!("Found {declared} member(s) in {name} interface")))
}

/// Item 2: factory exists with a member returning the capability, arity >= 1.
pub fn factory_creation_member(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.factory;
    let factory = ctx.prober.resolve_type(&cfg.factory)?;
    let capability = cfg.capability.as_str();
    let member = ctx.prober.find_member(
        factory,
        &matcher("creation member", |m| is_creation_member(m, capability)),
    );

    Ok(match member {
        Some(member) => Verdict::pass(format!(
            "{} exists with creation member {}",
            cfg.factory,
            member.name()
        )),
        None => Verdict::fail(format!(
            "{} should have a creation member that returns {capability}",
            cfg.factory
        )),
    })
}

/// Item 3: enough implementations of the capability, every one of them
/// default-constructible into a capability instance.
pub fn implementations(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.factory;
    let capability = ctx.prober.resolve_type(&cfg.capability)?;
    let (valid, rejected) = find_implementations(ctx, capability);
    let found = valid.len() + rejected.len();

    if found < cfg.min_implementations {
        return Ok(Verdict::fail(format!(
            "Should have at least {} {} implementations. Found: {found}",
            cfg.min_implementations, cfg.capability
        ))
        .with_details(rejected));
    }
    if let Some(first) = rejected.first() {
        return Ok(Verdict::fail(first.clone()).with_details(rejected.iter().skip(1).cloned()));
    }
    Ok(
        Verdict::pass(format!("Found {found} valid {} implementations", cfg.capability))
            .with_detail(format!("Implementations: {}", valid.join(", "))),
    )
}

/// Item 4: the factory produces capability instances for enough tokens.
pub fn factory_products(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.factory;
    let capability = ctx.prober.resolve_type(&cfg.capability)?;
    let rig = FactoryRig::open(ctx)?;

    let mut created = 0_usize;
    let mut notes = Vec::new();
    for token in &cfg.tokens {
        match rig.create(ctx, token) {
            Ok(value) if is_product(ctx, capability, &value) => created += 1,
            Ok(value) => notes.push(format!("Token {token} produced {value}")),
            Err(err) => notes.push(format!("Token {token} failed: {err}")),
        }
    }

    let verdict = if created >= cfg.min_created {
        Verdict::pass(format!("Factory successfully creates multiple {} types", cfg.capability))
            .with_detail(format!(
                "Successfully created products for {created} of {} tokens",
                cfg.tokens.len()
            ))
    } else {
        Verdict::fail(format!(
            "Factory should create at least {} different {} types, created {created}",
            cfg.min_created, cfg.capability
        ))
    };
    Ok(verdict.with_details(notes))
}

/// Item 5: an unknown token yields absent, a product, or a raised error.
pub fn unknown_token(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let rig = FactoryRig::open(ctx)?;
    let token = &ctx.config.factory.unknown_token;

    Ok(match rig.create(ctx, token) {
        Ok(value) if !value.is_present() => {
            Verdict::pass("Factory handles unknown types gracefully (returns nothing)")
        }
        Ok(_) => Verdict::pass("Factory handles unknown types gracefully"),
        Err(err) if err.is_raised() => {
            Verdict::pass("Factory handles unknown types by raising an error")
                .with_detail(format!("Unknown token {token}: {err}"))
        }
        Err(err) => Verdict::fail(format!("Unknown type handling test failed: {err}")),
    })
}

// =============================================================================
// TESTS
// =============================================================================
