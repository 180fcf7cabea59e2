//! # Manifest Module
//!
//! The published description of a submission's namespace.
//!
//! Rust has no runtime reflection, so a submission publishes a [`Manifest`]:
//! its types, their kinds and supertypes, the constructors and members each
//! declares, and callable bodies for the ones that have code. The
//! [`Prober`](crate::Prober) reads nothing else.
//!
//! ## Loading
//!
//! Turning a namespace identifier into a manifest is the job of an
//! [`ArtifactLoader`]. [`ManifestRegistry`] is the in-process loader: it keeps
//! one factory per namespace and builds a fresh manifest on every load, so no
//! submission state survives from one grading run to the next.

use crate::types::{GradeError, Instance, ParamKind, Raised, TypeKind, Value, Visibility};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Callable body of a member. The receiver is `None` for static members.
pub type MethodBody =
    Arc<dyn Fn(Option<&Instance>, &[Value]) -> Result<Value, Raised> + Send + Sync>;

/// Callable body of a constructor.
pub type ConstructorBody = Arc<dyn Fn(&[Value]) -> Result<Instance, Raised> + Send + Sync>;

/// Return type name used for members that produce nothing.
pub const VOID: &str = "void";

// =============================================================================
// MEMBER DESCRIPTOR
// =============================================================================

/// A method declared by (or inherited into) a type.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub name: String,
    pub params: Vec<ParamKind>,
    /// Simple name of the return type, `"void"` when nothing is returned.
    pub returns: String,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Inherited from a platform default rather than declared by the submission.
    pub inherited: bool,
    body: Option<MethodBody>,
}

impl MemberDescriptor {
    /// A public instance method returning `void`.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: VOID.to_string(),
            is_static: false,
            visibility: Visibility::Public,
            inherited: false,
            body: None,
        }
    }

    /// A public static method returning `void`.
    pub fn static_method(name: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::method(name)
        }
    }

    #[must_use]
    pub fn param(mut self, kind: ParamKind) -> Self {
        self.params.push(kind);
        self
    }

    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = type_name.into();
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as a platform default (`toString`, `equals`, ...).
    #[must_use]
    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Attach the code that runs when the member is invoked.
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&Instance>, &[Value]) -> Result<Value, Raised> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether the member has code to run.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub(crate) fn body_ref(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("is_static", &self.is_static)
            .field("visibility", &self.visibility)
            .field("inherited", &self.inherited)
            .field("has_body", &self.has_body())
            .finish()
    }
}

// =============================================================================
// CONSTRUCTOR DESCRIPTOR
// =============================================================================

/// A constructor declared by a concrete type.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub params: Vec<ParamKind>,
    pub visibility: Visibility,
    body: Option<ConstructorBody>,
}

impl ConstructorDescriptor {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            params: Vec::new(),
            visibility,
            body: None,
        }
    }

    pub fn public() -> Self {
        Self::new(Visibility::Public)
    }

    pub fn private() -> Self {
        Self::new(Visibility::Private)
    }

    #[must_use]
    pub fn param(mut self, kind: ParamKind) -> Self {
        self.params.push(kind);
        self
    }

    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Instance, Raised> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn body_ref(&self) -> Option<&ConstructorBody> {
        self.body.as_ref()
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

// =============================================================================
// TYPE DESCRIPTOR
// =============================================================================

/// One type published by the submission.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    /// Interfaces implemented and types extended, by simple name.
    pub supertypes: Vec<String>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            constructors: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Concrete)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    /// Declare a supertype (interface or base type).
    #[must_use]
    pub fn implements(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Members the submission declared itself.
    pub fn declared_members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.inherited)
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// Everything a submission publishes about one namespace.
#[derive(Debug, Clone)]
pub struct Manifest {
    namespace: String,
    types: BTreeMap<String, TypeDescriptor>,
}

impl Manifest {
    /// Create an empty manifest for a namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            types: BTreeMap::new(),
        }
    }

    /// Add a type. A later type with the same name replaces the earlier one.
    #[must_use]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Look up a type by simple name.
    #[must_use]
    pub fn get(&self, simple_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(simple_name)
    }

    /// Simple names of every published type, in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether `from` is `to` or has `to` among its transitive supertypes.
    ///
    /// Supertypes outside the manifest end the walk; cycles are tolerated.
    #[must_use]
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut pending = vec![from];

        while let Some(current) = pending.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.types.get(current) {
                pending.extend(descriptor.supertypes.iter().map(String::as_str));
            }
        }

        false
    }
}

// =============================================================================
// ARTIFACT LOADING
// =============================================================================

/// Resolves a namespace identifier into the submission's manifest.
///
/// # Extension Point
///
/// Implementations may load manifests from anywhere; the pipeline only asks
/// for one manifest per grading run and never caches it.
pub trait ArtifactLoader: Send + Sync {
    /// Load the manifest published under `namespace`.
    fn load(&self, namespace: &str) -> Result<Arc<Manifest>, GradeError>;

    /// Namespaces this loader can resolve, in sorted order.
    fn namespaces(&self) -> Vec<String>;
}

type ManifestFactory = Arc<dyn Fn() -> Manifest + Send + Sync>;

/// In-process loader keyed by namespace.
#[derive(Default, Clone)]
pub struct ManifestRegistry {
    factories: BTreeMap<String, ManifestFactory>,
}

impl ManifestRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest factory. Re-registering a namespace replaces it.
    pub fn register<F>(&mut self, namespace: impl Into<String>, factory: F)
    where
        F: Fn() -> Manifest + Send + Sync + 'static,
    {
        self.factories.insert(namespace.into(), Arc::new(factory));
    }

    /// Builder-style [`ManifestRegistry::register`].
    #[must_use]
    pub fn with<F>(mut self, namespace: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Manifest + Send + Sync + 'static,
    {
        self.register(namespace, factory);
        self
    }
}

impl fmt::Debug for ManifestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestRegistry")
            .field("namespaces", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ArtifactLoader for ManifestRegistry {
    fn load(&self, namespace: &str) -> Result<Arc<Manifest>, GradeError> {
        let trimmed = namespace.trim();
        if trimmed.is_empty() {
            return Err(GradeError::InvalidNamespace(namespace.to_string()));
        }

        self.factories
            .get(trimmed)
            .map(|factory| Arc::new(factory()))
            .ok_or_else(|| GradeError::NamespaceNotFound(trimmed.to_string()))
    }

    fn namespaces(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
