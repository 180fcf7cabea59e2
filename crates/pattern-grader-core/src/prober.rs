//! # Capability Prober
//!
//! Answers introspective questions about a submission's namespace.
//!
//! Every operation returns failures as data ([`ProbeError`]). Submission code
//! is always called through a panic guard, so a panic inside a constructor or
//! member body becomes [`ProbeError::Raised`] instead of unwinding into the
//! grader.
//!
//! ## Dispatch
//!
//! Interface members carry no body. Invoking one on an instance dispatches to
//! the member of the same name and arity declared by the instance's concrete
//! type, or failing that by one of its supertypes.

use crate::manifest::{ConstructorDescriptor, Manifest, MemberDescriptor, MethodBody, TypeDescriptor};
use crate::predicates::MemberPredicate;
use crate::types::{Instance, ProbeError, Raised, TypeKind, Value, Visibility};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeSet, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

// =============================================================================
// HANDLES
// =============================================================================

/// A resolved type, valid for the lifetime of the prober.
#[derive(Debug, Clone, Copy)]
pub struct TypeHandle<'p> {
    descriptor: &'p TypeDescriptor,
}

impl<'p> TypeHandle<'p> {
    #[must_use]
    pub fn name(&self) -> &'p str {
        &self.descriptor.name
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.descriptor.kind
    }

    #[must_use]
    pub fn descriptor(&self) -> &'p TypeDescriptor {
        self.descriptor
    }

    #[must_use]
    pub fn constructors(&self) -> &'p [ConstructorDescriptor] {
        &self.descriptor.constructors
    }
}

/// A resolved member together with the type that declares it.
#[derive(Debug, Clone, Copy)]
pub struct MemberHandle<'p> {
    owner: &'p TypeDescriptor,
    member: &'p MemberDescriptor,
}

impl<'p> MemberHandle<'p> {
    #[must_use]
    pub fn name(&self) -> &'p str {
        &self.member.name
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.member.arity()
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.member.is_static
    }

    #[must_use]
    pub fn returns(&self) -> &'p str {
        &self.member.returns
    }

    #[must_use]
    pub fn owner_name(&self) -> &'p str {
        &self.owner.name
    }

    #[must_use]
    pub fn descriptor(&self) -> &'p MemberDescriptor {
        self.member
    }

    /// Qualified label used in diagnostics, e.g. `NodeManager.getInstance`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.owner.name, self.member.name)
    }
}

/// Flat view of one member, as returned by [`Prober::list_members`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub name: String,
    pub arity: usize,
    pub is_static: bool,
    pub visibility: Visibility,
    pub returns: String,
    pub inherited: bool,
}

impl From<&MemberDescriptor> for MemberInfo {
    fn from(member: &MemberDescriptor) -> Self {
        Self {
            name: member.name.clone(),
            arity: member.arity(),
            is_static: member.is_static,
            visibility: member.visibility,
            returns: member.returns.clone(),
            inherited: member.inherited,
        }
    }
}

// =============================================================================
// SHARED ACCESSOR
// =============================================================================

/// An owned, thread-safe handle to a static zero-argument accessor.
///
/// Produced by [`Prober::shared_accessor`] so the accessor can be called from
/// threads that do not borrow the prober.
#[derive(Clone)]
pub struct SharedAccessor {
    label: String,
    body: MethodBody,
}

impl SharedAccessor {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Call the accessor once. A non-object return is an invocation failure.
    pub fn call(&self) -> Result<Instance, ProbeError> {
        let value = guarded(&self.label, || (self.body)(None, &[]))?;
        value.into_instance().ok_or_else(|| ProbeError::InvocationFailure {
            member: self.label.clone(),
            reason: "accessor returned no instance".to_string(),
        })
    }
}

impl std::fmt::Debug for SharedAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAccessor")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PROBER
// =============================================================================

/// Read-only view over one submission manifest, valid for one grading run.
#[derive(Debug, Clone)]
pub struct Prober {
    manifest: Arc<Manifest>,
}

impl Prober {
    pub fn new(manifest: Arc<Manifest>) -> Self {
        Self { manifest }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.manifest.namespace()
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    // -------------------------------------------------------------------------
    // Type queries
    // -------------------------------------------------------------------------

    /// Resolve a simple or namespace-qualified type name.
    pub fn resolve_type(&self, name: &str) -> Result<TypeHandle<'_>, ProbeError> {
        let simple = name
            .strip_prefix(self.namespace())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);

        self.manifest
            .get(simple)
            .map(|descriptor| TypeHandle { descriptor })
            .ok_or_else(|| ProbeError::TypeNotFound {
                namespace: self.namespace().to_string(),
                name: simple.to_string(),
            })
    }

    /// Resolve a type and require it to be an interface.
    pub fn require_interface(&self, name: &str) -> Result<TypeHandle<'_>, ProbeError> {
        self.require_kind(name, TypeKind::Interface)
    }

    /// Resolve a type and require it to be concrete.
    pub fn require_concrete(&self, name: &str) -> Result<TypeHandle<'_>, ProbeError> {
        self.require_kind(name, TypeKind::Concrete)
    }

    fn require_kind(&self, name: &str, expected: TypeKind) -> Result<TypeHandle<'_>, ProbeError> {
        let handle = self.resolve_type(name)?;
        if handle.kind() != expected {
            return Err(ProbeError::KindMismatch {
                name: handle.name().to_string(),
                expected,
                found: handle.kind(),
            });
        }
        Ok(handle)
    }

    #[must_use]
    pub fn is_interface_kind(&self, handle: TypeHandle<'_>) -> bool {
        handle.kind().is_interface()
    }

    /// Whether `from` is `to` or one of its transitive subtypes.
    #[must_use]
    pub fn is_assignable(&self, from: TypeHandle<'_>, to: TypeHandle<'_>) -> bool {
        self.manifest.is_assignable(from.name(), to.name())
    }

    /// Whether the instance's concrete type is assignable to `handle`.
    #[must_use]
    pub fn is_instance_of(&self, instance: &Instance, handle: TypeHandle<'_>) -> bool {
        self.manifest.is_assignable(instance.type_name(), handle.name())
    }

    // -------------------------------------------------------------------------
    // Member queries
    // -------------------------------------------------------------------------

    /// All members of a type, declared and inherited.
    ///
    /// Declared members come first, in declaration order, followed by
    /// supertype members in breadth-first order. A supertype member with the
    /// same name and arity as one already seen is hidden by it.
    #[must_use]
    pub fn list_members(&self, handle: TypeHandle<'_>) -> Vec<MemberInfo> {
        self.visible_members(handle)
            .into_iter()
            .map(|member| {
                let mut info = MemberInfo::from(member.member);
                info.inherited |= member.owner.name != handle.name();
                info
            })
            .collect()
    }

    /// First member satisfying the predicate, declared or inherited.
    pub fn find_member<'p>(
        &'p self,
        handle: TypeHandle<'p>,
        predicate: &dyn MemberPredicate,
    ) -> Option<MemberHandle<'p>> {
        self.visible_members(handle)
            .into_iter()
            .find(|member| predicate.matches(member.member))
    }

    /// Every member satisfying the predicate, declared or inherited.
    pub fn find_members<'p>(
        &'p self,
        handle: TypeHandle<'p>,
        predicate: &dyn MemberPredicate,
    ) -> Vec<MemberHandle<'p>> {
        self.visible_members(handle)
            .into_iter()
            .filter(|member| predicate.matches(member.member))
            .collect()
    }

    fn visible_members<'p>(&'p self, handle: TypeHandle<'p>) -> Vec<MemberHandle<'p>> {
        let mut members: Vec<MemberHandle<'p>> = Vec::new();
        let mut visited = BTreeSet::new();
        let mut pending = VecDeque::from([handle.descriptor]);

        while let Some(owner) = pending.pop_front() {
            if !visited.insert(owner.name.as_str()) {
                continue;
            }
            for member in &owner.members {
                let hidden = members.iter().any(|seen| {
                    seen.member.name == member.name && seen.member.arity() == member.arity()
                });
                if !hidden {
                    members.push(MemberHandle { owner, member });
                }
            }
            pending.extend(
                owner
                    .supertypes
                    .iter()
                    .filter_map(|name| self.manifest.get(name)),
            );
        }

        members
    }

    /// Like [`Prober::find_member`], but absence is a [`ProbeError::MemberNotFound`].
    pub fn require_member<'p>(
        &'p self,
        handle: TypeHandle<'p>,
        predicate: &dyn MemberPredicate,
    ) -> Result<MemberHandle<'p>, ProbeError> {
        self.find_member(handle, predicate)
            .ok_or_else(|| ProbeError::MemberNotFound {
                type_name: handle.name().to_string(),
                description: predicate.describe(),
            })
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create an instance.
    ///
    /// Uses an accessible constructor whose arity matches `args`. With no
    /// arguments and no such constructor, a static zero-argument member
    /// returning the same type is used instead.
    pub fn instantiate(
        &self,
        handle: TypeHandle<'_>,
        args: &[Value],
    ) -> Result<Instance, ProbeError> {
        if !handle.kind().is_instantiable() {
            return Err(ProbeError::ConstructionFailure {
                type_name: handle.name().to_string(),
                reason: format!("{} is {}", handle.name(), handle.kind()),
            });
        }

        let constructor = handle
            .constructors()
            .iter()
            .find(|ctor| ctor.visibility.is_accessible() && ctor.arity() == args.len());
        if let Some(constructor) = constructor {
            return self.construct(handle, constructor, args);
        }

        if args.is_empty()
            && let Some(fallback) = handle.descriptor.members.iter().find(|member| {
                member.is_static && member.arity() == 0 && member.returns == handle.name()
            })
        {
            tracing::debug!(
                type_name = handle.name(),
                member = %fallback.name,
                "No accessible constructor, using static fallback"
            );
            let fallback = MemberHandle {
                owner: handle.descriptor,
                member: fallback,
            };
            return self
                .invoke(None, fallback, &[])?
                .into_instance()
                .ok_or_else(|| ProbeError::ConstructionFailure {
                    type_name: handle.name().to_string(),
                    reason: format!("{} returned no instance", fallback.label()),
                });
        }

        Err(ProbeError::NoSuitableConstructor(handle.name().to_string()))
    }

    /// Run one specific constructor.
    pub fn construct(
        &self,
        handle: TypeHandle<'_>,
        constructor: &ConstructorDescriptor,
        args: &[Value],
    ) -> Result<Instance, ProbeError> {
        let failure = |reason: String| ProbeError::ConstructionFailure {
            type_name: handle.name().to_string(),
            reason,
        };

        if constructor.arity() != args.len() {
            return Err(failure(format!(
                "expected {} argument(s), got {}",
                constructor.arity(),
                args.len()
            )));
        }
        let Some(body) = constructor.body_ref() else {
            return Err(failure("constructor has no body".to_string()));
        };

        match catch_unwind(AssertUnwindSafe(|| body(args))) {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(raised)) => Err(failure(raised.0)),
            Err(payload) => Err(failure(panic_message(payload.as_ref()))),
        }
    }

    // -------------------------------------------------------------------------
    // Invocation
    // -------------------------------------------------------------------------

    /// Call a member. Static members ignore `receiver`.
    pub fn invoke(
        &self,
        receiver: Option<&Instance>,
        member: MemberHandle<'_>,
        args: &[Value],
    ) -> Result<Value, ProbeError> {
        let label = member.label();
        let failure = |reason: &str| ProbeError::InvocationFailure {
            member: label.clone(),
            reason: reason.to_string(),
        };

        if member.arity() != args.len() {
            return Err(failure(&format!(
                "expected {} argument(s), got {}",
                member.arity(),
                args.len()
            )));
        }

        let receiver = if member.is_static() {
            None
        } else {
            Some(receiver.ok_or_else(|| failure("no receiver for instance member"))?)
        };

        let body = match member.member.body_ref() {
            Some(body) => Arc::clone(body),
            None => receiver
                .and_then(|instance| self.dispatch(instance, member.member))
                .ok_or_else(|| failure("no implementation to dispatch to"))?,
        };

        let result = guarded(&label, || body(receiver, args));
        if let Err(err) = &result {
            tracing::debug!(member = %label, error = %err, "Invocation failed");
        }
        result
    }

    /// Find the body that implements `member` for the instance's concrete type.
    fn dispatch(&self, instance: &Instance, member: &MemberDescriptor) -> Option<MethodBody> {
        let mut visited = BTreeSet::new();
        let mut pending = VecDeque::from([instance.type_name()]);

        while let Some(current) = pending.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(descriptor) = self.manifest.get(current) else {
                continue;
            };
            let implementation = descriptor.members.iter().find(|candidate| {
                candidate.name == member.name
                    && candidate.arity() == member.arity()
                    && candidate.has_body()
            });
            if let Some(body) = implementation.and_then(MemberDescriptor::body_ref) {
                return Some(Arc::clone(body));
            }
            pending.extend(descriptor.supertypes.iter().map(String::as_str));
        }

        None
    }

    /// Detach a static zero-argument accessor for use across threads.
    pub fn shared_accessor(&self, member: MemberHandle<'_>) -> Result<SharedAccessor, ProbeError> {
        let label = member.label();
        if !member.is_static() || member.arity() != 0 {
            return Err(ProbeError::InvocationFailure {
                member: label,
                reason: "not a static zero-argument accessor".to_string(),
            });
        }
        let body = member
            .member
            .body_ref()
            .cloned()
            .ok_or_else(|| ProbeError::InvocationFailure {
                member: label.clone(),
                reason: "accessor has no body".to_string(),
            })?;
        Ok(SharedAccessor { label, body })
    }
}

// =============================================================================
// PANIC GUARD
// =============================================================================

/// Run submission code, converting raised errors and panics into data.
fn guarded<F>(label: &str, call: F) -> Result<Value, ProbeError>
where
    F: FnOnce() -> Result<Value, Raised>,
{
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(raised)) => Err(ProbeError::Raised {
            member: label.to_string(),
            message: raised.0,
        }),
        Err(payload) => Err(ProbeError::Raised {
            member: label.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-text payload".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
