//! # Observer Checklist
//!
//! Verifies publish/subscribe notification: an observer capability, an event
//! payload with accessors, a publisher that manages subscribers, concrete
//! observers, and that the participants can actually be constructed.

use super::{CheckItem, Checklist, ProbeContext, Verdict};
use crate::manifest::MemberDescriptor;
use crate::predicates::{contains_ignore_case, is_accessor, matcher, name_contains_any};
use crate::prober::TypeHandle;
use crate::types::{Instance, ParamKind, ProbeError, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const LABEL: &str = "Observer Pattern";

/// Text arguments handed to event constructors, in parameter order.
const EVENT_TEXT_ARGUMENTS: [&str; 3] = ["test-id", "INFO", "Test message"];

/// The five observer items, in order.
pub fn checklist() -> Checklist {
    Checklist::new(
        LABEL,
        vec![
            CheckItem::new("Observer capability", observer_capability),
            CheckItem::new("Event payload", event_payload),
            CheckItem::new("Publisher members", publisher_members),
            CheckItem::new("Observer implementations", observer_implementations),
            CheckItem::new("Participant construction", participant_construction),
        ],
    )
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Single-argument notification member (`onEvent`, `update`, `notify`...).
#[must_use]
pub fn is_notification_member(member: &MemberDescriptor) -> bool {
    member.arity() == 1 && name_contains_any(member, &["event", "update", "notify"])
}

/// Zero-argument identifier member (`getObserverId`, `getId`...).
#[must_use]
pub fn is_identifier_member(member: &MemberDescriptor) -> bool {
    member.arity() == 0 && contains_ignore_case(&member.name, "id")
}

/// Zero-argument accessor whose name contains `fragment`.
#[must_use]
pub fn is_event_accessor(member: &MemberDescriptor, fragment: &str) -> bool {
    is_accessor(member) && contains_ignore_case(&member.name, fragment)
}

pub fn is_subscribe_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names)
}

pub fn is_unsubscribe_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names)
}

pub fn is_publish_member(member: &MemberDescriptor, names: &[String]) -> bool {
    name_contains_any(member, names)
}

// =============================================================================
// SHARED PROBES
// =============================================================================

/// Arguments for an event constructor: sample texts in order, the current
/// time for long parameters, synthesized defaults for everything else.
pub(crate) fn event_arguments(params: &[ParamKind]) -> Vec<Value> {
    let mut texts = EVENT_TEXT_ARGUMENTS.iter();
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default();

    params
        .iter()
        .map(|param| match param {
            ParamKind::Text => Value::Text(texts.next().copied().unwrap_or("test").to_string()),
            ParamKind::Long => Value::Long(now_ms),
            other => other.synthesized_default(),
        })
        .collect()
}

/// Try every accessible constructor, widest first, then the zero-argument path.
pub(crate) fn construct_event(
    ctx: &ProbeContext<'_>,
    event: TypeHandle<'_>,
) -> Result<Instance, ProbeError> {
    let mut constructors: Vec<_> = event
        .constructors()
        .iter()
        .filter(|ctor| ctor.visibility.is_accessible() && ctor.arity() > 0)
        .collect();
    constructors.sort_by(|a, b| b.arity().cmp(&a.arity()));

    let mut last_error = None;
    for ctor in constructors {
        match ctx.prober.construct(event, ctor, &event_arguments(&ctor.params)) {
            Ok(instance) => return Ok(instance),
            Err(err) => last_error = Some(err),
        }
    }

    ctx.prober
        .instantiate(event, &[])
        .map_err(|err| last_error.unwrap_or(err))
}

/// The first named observer that default-constructs.
pub(crate) fn construct_observer(ctx: &ProbeContext<'_>) -> Result<Instance, ProbeError> {
    let mut last_error = ProbeError::Unexpected("no observer types configured".to_string());
    for name in &ctx.config.observer.observers {
        let attempt = ctx
            .prober
            .resolve_type(name)
            .and_then(|handle| ctx.prober.instantiate(handle, &[]));
        match attempt {
            Ok(instance) => return Ok(instance),
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item 1: observer capability with notification and identifier members.
pub fn observer_capability(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let name = &ctx.config.observer.capability;
    let capability = ctx.prober.require_interface(name)?;
    let notify = ctx
        .prober
        .find_member(capability, &matcher("notification", is_notification_member));
    let identify = ctx
        .prober
        .find_member(capability, &matcher("identifier", is_identifier_member));

    Ok(match (notify, identify) {
        (Some(notify), Some(identify)) => {
            Verdict::pass(format!("{name} interface is properly defined")).with_detail(format!(
                "Found required members: {}() and {}()",
                notify.name(),
                identify.name()
            ))
        }
        _ => Verdict::fail(format!("{name} interface missing required members"))
            .with_detail("Required: a single-argument notification member and a zero-argument identifier member"),
    })
}

/// Item 2: concrete event type with enough accessors covering the fragments.
pub fn event_payload(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.observer;
    let event = ctx.prober.require_concrete(&cfg.event)?;
    let accessors = ctx.prober.find_members(event, &matcher("accessor", is_accessor));
    let missing: Vec<&str> = cfg
        .event_accessors
        .iter()
        .map(String::as_str)
        .filter(|fragment| {
            !accessors
                .iter()
                .any(|m| is_event_accessor(m.descriptor(), fragment))
        })
        .collect();

    if accessors.len() >= cfg.min_accessors && missing.is_empty() {
        return Ok(
            Verdict::pass(format!("{} has required accessors", cfg.event)).with_detail(format!(
                "Found accessors for: {}",
                cfg.event_accessors.join(", ")
            )),
        );
    }

    let mut verdict = Verdict::fail(format!(
        "{} should have at least {} accessors, found {}",
        cfg.event,
        cfg.min_accessors,
        accessors.len()
    ));
    if !missing.is_empty() {
        verdict = verdict.with_detail(format!("Missing accessors for: {}", missing.join(", ")));
    }
    Ok(verdict)
}

/// Item 3: publisher with subscribe, unsubscribe and publish members.
pub fn publisher_members(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.observer;
    let publisher = ctx.prober.resolve_type(&cfg.publisher)?;
    let has = |label: &str, rule: &dyn Fn(&MemberDescriptor) -> bool| {
        ctx.prober
            .find_member(publisher, &matcher(label, |m| !m.inherited && rule(m)))
            .is_some()
    };

    let subscribe = has("subscribe", &|m| is_subscribe_member(m, &cfg.subscribe_names));
    let unsubscribe = has("unsubscribe", &|m| is_unsubscribe_member(m, &cfg.unsubscribe_names));
    let publish = has("publish", &|m| is_publish_member(m, &cfg.publish_names));

    if subscribe && unsubscribe && publish {
        return Ok(Verdict::pass(format!("{} has required members", cfg.publisher))
            .with_detail("Found members for: add/remove observers, publish events"));
    }

    let missing: Vec<&str> = [
        (subscribe, "add observer"),
        (unsubscribe, "remove observer"),
        (publish, "publish event"),
    ]
    .into_iter()
    .filter(|(found, _)| !found)
    .map(|(_, label)| label)
    .collect();
    Ok(
        Verdict::fail(format!("{} missing required members", cfg.publisher))
            .with_detail(format!("Missing: {}", missing.join(", "))),
    )
}

/// Item 4: enough named concrete observers implement the capability.
pub fn observer_implementations(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.observer;
    let capability = ctx.prober.resolve_type(&cfg.capability)?;

    let mut implementing = Vec::new();
    let mut notes = Vec::new();
    for name in &cfg.observers {
        match ctx.prober.resolve_type(name) {
            Ok(handle)
                if handle.kind().is_instantiable()
                    && ctx.prober.is_assignable(handle, capability) =>
            {
                implementing.push(name.as_str());
            }
            Ok(_) => notes.push(format!("{name} does not implement {}", cfg.capability)),
            Err(err) => notes.push(err.to_string()),
        }
    }

    let verdict = if implementing.len() >= cfg.min_observers {
        Verdict::pass(format!(
            "{} implement {}",
            implementing.join(", "),
            cfg.capability
        ))
    } else {
        Verdict::fail(format!(
            "Should have at least {} {} implementations, found {}",
            cfg.min_observers,
            cfg.capability,
            implementing.len()
        ))
    };
    Ok(verdict.with_details(notes))
}

/// Item 5: publisher, event and one observer can all be constructed.
pub fn participant_construction(ctx: &ProbeContext<'_>) -> Result<Verdict, ProbeError> {
    let cfg = &ctx.config.observer;
    let publisher = ctx.prober.resolve_type(&cfg.publisher)?;
    let event = ctx.prober.resolve_type(&cfg.event)?;

    ctx.prober.instantiate(publisher, &[])?;
    construct_event(ctx, event)?;
    let observer = construct_observer(ctx)?;

    Ok(Verdict::pass("Observer pattern participants construct successfully").with_detail(
        format!(
            "Created {}, {} and {}",
            cfg.publisher,
            cfg.event,
            observer.type_name()
        ),
    ))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_and_identifier_shapes() {
        let on_event = MemberDescriptor::method("onEvent").param(ParamKind::Object("ProcessEvent".into()));
        let get_id = MemberDescriptor::method("getObserverId").returns("String");
        assert!(is_notification_member(&on_event));
        assert!(!is_notification_member(&get_id));
        assert!(is_identifier_member(&get_id));
        assert!(!is_identifier_member(&on_event));
    }

    #[test]
    fn event_accessor_fragments() {
        let timestamp = MemberDescriptor::method("getTimestamp").returns("long");
        assert!(is_event_accessor(&timestamp, "time"));
        assert!(!is_event_accessor(&timestamp, "type"));
        assert!(!is_event_accessor(&MemberDescriptor::method("getTime"), "time"));
    }

    #[test]
    fn publisher_name_rules() {
        let names = vec!["add".to_string(), "register".to_string(), "subscribe".to_string()];
        assert!(is_subscribe_member(&MemberDescriptor::method("addObserver"), &names));
        assert!(is_subscribe_member(&MemberDescriptor::method("Subscribe"), &names));
        assert!(!is_subscribe_member(&MemberDescriptor::method("publishEvent"), &names));
        let removal = vec!["remove".to_string()];
        assert!(is_unsubscribe_member(&MemberDescriptor::method("removeObserver"), &removal));
        let publish = vec!["publish".to_string(), "notify".to_string()];
        assert!(is_publish_member(&MemberDescriptor::method("notifyAll"), &publish));
    }

    #[test]
    fn event_arguments_follow_params() {
        let args = event_arguments(&[
            ParamKind::Text,
            ParamKind::Text,
            ParamKind::Text,
            ParamKind::Long,
            ParamKind::Text,
        ]);
        assert_eq!(args[0].as_text(), Some("test-id"));
        assert_eq!(args[2].as_text(), Some("Test message"));
        assert!(matches!(args[3], Value::Long(ms) if ms > 0));
        assert_eq!(args[4].as_text(), Some("test"));
    }
}
