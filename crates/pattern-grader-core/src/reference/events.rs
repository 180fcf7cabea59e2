//! Process events, the publisher that fans them out, and two observers.

use super::{object_arg, receiver, text_arg};
use crate::manifest::{ConstructorDescriptor, MemberDescriptor, TypeDescriptor};
use crate::types::{Instance, ParamKind, Raised, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Something that wants to hear about process events.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &ProcessEvent);
    fn observer_id(&self) -> &str;
}

/// What every observer instance wraps, so the publisher can hold any of them.
#[derive(Clone)]
pub(crate) struct ObserverHandle(Arc<dyn EventSink>);

/// An event emitted by a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    pub event_id: String,
    pub event_type: String,
    pub message: String,
    pub timestamp: i64,
}

/// Fans events out to registered observers.
#[derive(Default)]
pub struct EventPublisher {
    observers: Mutex<Vec<ObserverHandle>>,
}

impl EventPublisher {
    fn add(&self, observer: ObserverHandle) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    fn remove(&self, observer: &ObserverHandle) -> bool {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|existing| !Arc::ptr_eq(&existing.0, &observer.0));
        observers.len() != before
    }

    /// Deliver to every observer; returns how many were notified.
    pub fn publish(&self, event: &ProcessEvent) -> usize {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.0.on_event(event);
        }
        observers.len()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Records every event as a log line.
#[derive(Debug, Default)]
pub struct LoggingObserver {
    lines: Mutex<Vec<String>>,
}

impl LoggingObserver {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl EventSink for LoggingObserver {
    fn on_event(&self, event: &ProcessEvent) {
        tracing::debug!(event_id = %event.event_id, "LoggingObserver received event");
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("[{}] {}: {}", event.event_type, event.event_id, event.message));
    }

    fn observer_id(&self) -> &str {
        "logging-observer"
    }
}

/// Counts events whose type signals trouble.
#[derive(Debug, Default)]
pub struct AlertingObserver {
    alerts: AtomicUsize,
}

impl AlertingObserver {
    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alerts.load(Ordering::SeqCst)
    }
}

impl EventSink for AlertingObserver {
    fn on_event(&self, event: &ProcessEvent) {
        if matches!(event.event_type.to_ascii_uppercase().as_str(), "ERROR" | "ALERT") {
            self.alerts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn observer_id(&self) -> &str {
        "alerting-observer"
    }
}

fn observer_type<S, F>(name: &'static str, make: F) -> TypeDescriptor
where
    S: EventSink + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    TypeDescriptor::class(name)
        .implements("EventObserver")
        .constructor(
            ConstructorDescriptor::public()
                .body(move |_| Ok(Instance::new(name, ObserverHandle(Arc::new(make()))))),
        )
        .member(
            MemberDescriptor::method("onEvent")
                .param(ParamKind::Object("ProcessEvent".into()))
                .body(|this, args| {
                    let observer = receiver::<ObserverHandle>(this, "EventObserver")?;
                    observer
                        .0
                        .on_event(object_arg::<ProcessEvent>(args, 0, "ProcessEvent")?);
                    Ok(Value::Unit)
                }),
        )
        .member(
            MemberDescriptor::method("getObserverId")
                .returns("String")
                .body(|this, _| {
                    let observer = receiver::<ObserverHandle>(this, "EventObserver")?;
                    Ok(Value::Text(observer.0.observer_id().to_string()))
                }),
        )
}

fn event_accessor(name: &str, returns: &str, read: fn(&ProcessEvent) -> Value) -> MemberDescriptor {
    MemberDescriptor::method(name)
        .returns(returns)
        .body(move |this, _| Ok(read(receiver::<ProcessEvent>(this, "ProcessEvent")?)))
}

fn observer_arg(args: &[Value]) -> Result<ObserverHandle, Raised> {
    object_arg::<ObserverHandle>(args, 0, "EventObserver").cloned()
}

pub(super) fn types() -> Vec<TypeDescriptor> {
    let capability = TypeDescriptor::interface("EventObserver")
        .member(MemberDescriptor::method("onEvent").param(ParamKind::Object("ProcessEvent".into())))
        .member(MemberDescriptor::method("getObserverId").returns("String"));

    let event = TypeDescriptor::class("ProcessEvent")
        .constructor(
            ConstructorDescriptor::public()
                .param(ParamKind::Text)
                .param(ParamKind::Text)
                .param(ParamKind::Text)
                .param(ParamKind::Long)
                .body(|args| {
                    let timestamp = match args.get(3) {
                        Some(Value::Long(ms)) => *ms,
                        _ => return Err(Raised::new("argument 3 must be a timestamp")),
                    };
                    Ok(Instance::new(
                        "ProcessEvent",
                        ProcessEvent {
                            event_id: text_arg(args, 0)?.to_string(),
                            event_type: text_arg(args, 1)?.to_string(),
                            message: text_arg(args, 2)?.to_string(),
                            timestamp,
                        },
                    ))
                }),
        )
        .member(event_accessor("getEventId", "String", |e| Value::Text(e.event_id.clone())))
        .member(event_accessor("getEventType", "String", |e| Value::Text(e.event_type.clone())))
        .member(event_accessor("getMessage", "String", |e| Value::Text(e.message.clone())))
        .member(event_accessor("getTimestamp", "long", |e| Value::Long(e.timestamp)));

    let publisher = TypeDescriptor::class("EventPublisher")
        .constructor(
            ConstructorDescriptor::public()
                .body(|_| Ok(Instance::new("EventPublisher", EventPublisher::default()))),
        )
        .member(
            MemberDescriptor::method("addObserver")
                .param(ParamKind::Object("EventObserver".into()))
                .body(|this, args| {
                    receiver::<EventPublisher>(this, "EventPublisher")?.add(observer_arg(args)?);
                    Ok(Value::Unit)
                }),
        )
        .member(
            MemberDescriptor::method("removeObserver")
                .param(ParamKind::Object("EventObserver".into()))
                .returns("boolean")
                .body(|this, args| {
                    let removed = receiver::<EventPublisher>(this, "EventPublisher")?
                        .remove(&observer_arg(args)?);
                    Ok(Value::Boolean(removed))
                }),
        )
        .member(
            MemberDescriptor::method("publishEvent")
                .param(ParamKind::Object("ProcessEvent".into()))
                .returns("int")
                .body(|this, args| {
                    let publisher = receiver::<EventPublisher>(this, "EventPublisher")?;
                    let notified =
                        publisher.publish(object_arg::<ProcessEvent>(args, 0, "ProcessEvent")?);
                    Ok(Value::Integer(i32::try_from(notified).unwrap_or(i32::MAX)))
                }),
        )
        .member(
            MemberDescriptor::method("getObserverCount")
                .returns("int")
                .body(|this, _| {
                    let count = receiver::<EventPublisher>(this, "EventPublisher")?.observer_count();
                    Ok(Value::Integer(i32::try_from(count).unwrap_or(i32::MAX)))
                }),
        );

    vec![
        capability,
        event,
        publisher,
        observer_type("LoggingObserver", LoggingObserver::default),
        observer_type("AlertingObserver", AlertingObserver::default),
    ]
}
