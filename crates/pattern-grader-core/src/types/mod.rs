//! # Core Type Definitions
//!
//! This module contains the vocabulary shared by the prober, the checklists
//! and the manifests that submissions publish:
//! - Structural descriptors (`TypeKind`, `Visibility`, `ParamKind`)
//! - Runtime values crossing the probe boundary (`Value`, `Instance`)
//! - Error types (`Raised`, `ProbeError`, `GradeError`)
//!
//! ## Identity
//!
//! An [`Instance`] is a shared handle. Two instances are the *same* object
//! when they point at the same allocation; equality of contents is never
//! consulted. The singleton checks depend on this.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// STRUCTURAL DESCRIPTORS
// =============================================================================

/// What kind of type a manifest entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A capability contract with no constructors and no member bodies.
    Interface,
    /// A partial implementation that cannot be instantiated directly.
    Abstract,
    /// An instantiable type.
    Concrete,
}

impl TypeKind {
    /// Whether this kind is a capability contract.
    #[must_use]
    pub const fn is_interface(self) -> bool {
        matches!(self, TypeKind::Interface)
    }

    /// Whether instances of this kind can be created.
    #[must_use]
    pub const fn is_instantiable(self) -> bool {
        matches!(self, TypeKind::Concrete)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Interface => write!(f, "an interface"),
            TypeKind::Abstract => write!(f, "an abstract type"),
            TypeKind::Concrete => write!(f, "a concrete type"),
        }
    }
}

/// Declared visibility of a constructor or member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    /// Public visibility.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    /// Whether code outside the submission may call through this entry.
    ///
    /// Only private entries are closed to the grader.
    #[must_use]
    pub const fn is_accessible(self) -> bool {
        !matches!(self, Visibility::Private)
    }
}

/// Declared kind of a constructor or member parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Integer,
    Long,
    Real,
    Boolean,
    /// A reference to another type, by simple name.
    Object(String),
}

impl ParamKind {
    /// Synthesized argument used when a constructor must be called blind.
    ///
    /// Text becomes `"test"`, numbers become zero, booleans `false`, and
    /// object references are left absent.
    #[must_use]
    pub fn synthesized_default(&self) -> Value {
        match self {
            ParamKind::Text => Value::Text("test".to_string()),
            ParamKind::Integer => Value::Integer(0),
            ParamKind::Long => Value::Long(0),
            ParamKind::Real => Value::Real(0.0),
            ParamKind::Boolean => Value::Boolean(false),
            ParamKind::Object(_) => Value::Absent,
        }
    }

    /// Type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            ParamKind::Text => "String",
            ParamKind::Integer => "int",
            ParamKind::Long => "long",
            ParamKind::Real => "double",
            ParamKind::Boolean => "boolean",
            ParamKind::Object(name) => name,
        }
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

/// A live object created by submission code.
///
/// The grader never looks inside; submission code recovers its own type
/// with [`Instance::downcast_ref`].
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wrap a freshly created value.
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self::from_shared(type_name, Arc::new(value))
    }

    /// Wrap an already shared value. Cloning the same `Arc` yields the same instance.
    pub fn from_shared<T: Any + Send + Sync>(type_name: impl Into<String>, shared: Arc<T>) -> Self {
        Self {
            type_name: Arc::from(type_name.into()),
            object: shared,
        }
    }

    /// Simple name of the concrete type that created this instance.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the underlying value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Identity comparison: both handles point at the same object.
    #[must_use]
    pub fn same_instance(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    /// Address-based identity key. Only meaningful while the instance is alive.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.object).cast::<()>().addr()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name, self.identity())
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A value passed to or returned from submission code.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value (a null reference).
    #[default]
    Absent,
    /// Completed without a result (`void`).
    Unit,
    Text(String),
    Integer(i32),
    Long(i64),
    Real(f64),
    Boolean(bool),
    Object(Instance),
}

impl Value {
    /// Whether the call produced something usable (neither null nor void).
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Absent | Value::Unit)
    }

    /// The instance carried by this value, if any.
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Consume the value, keeping only an instance.
    #[must_use]
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// The text carried by this value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "null"),
            Value::Unit => write!(f, "void"),
            Value::Text(text) => write!(f, "{text}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Real(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Object(instance) => write!(f, "{instance:?}"),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// An error raised by submission code (the submission's "exception").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Raised(pub String);

impl Raised {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failures of a single probe against the submission.
///
/// Every variant is data: checklist items turn each one into exactly one
/// failed entry and the run moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The named type is not part of the namespace.
    #[error("{name} not found in namespace {namespace}")]
    TypeNotFound { namespace: String, name: String },

    /// The type exists but has the wrong kind.
    #[error("{name} should be {expected}, but found {found}")]
    KindMismatch {
        name: String,
        expected: TypeKind,
        found: TypeKind,
    },

    /// No member of the type satisfies the predicate.
    #[error("{type_name} has no member matching {description}")]
    MemberNotFound {
        type_name: String,
        description: String,
    },

    /// No accessible constructor or static fallback fits the request.
    #[error("no suitable constructor for {0}")]
    NoSuitableConstructor(String),

    /// A constructor was found but creating the instance failed.
    #[error("cannot construct {type_name}: {reason}")]
    ConstructionFailure { type_name: String, reason: String },

    /// The prober could not complete a call (missing body, wrong arity, no receiver).
    #[error("invocation of {member} failed: {reason}")]
    InvocationFailure { member: String, reason: String },

    /// Submission code raised an error or panicked while being called.
    #[error("{member} raised: {message}")]
    Raised { member: String, message: String },

    /// A bounded operation did not finish in time.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Anything the taxonomy above does not cover.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl ProbeError {
    /// Whether this failure originated inside submission code.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        matches!(self, ProbeError::Raised { .. })
    }
}

/// Errors that stop a grading run before or outside the stage chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    /// The namespace identifier is blank.
    #[error("Invalid namespace identifier: {0:?}")]
    InvalidNamespace(String),

    /// No artifact is registered under the identifier.
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// The grading configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
