//! # pattern-grader-core
//!
//! The design-pattern compliance engine for Pattern Grader - THE PIPELINE.
//!
//! Given the namespace of a submission, the engine resolves its published
//! manifest, runs an ordered chain of grading stages against it, and merges
//! every stage's checklist into one [`GradeResult`].
//!
//! ## Layout
//!
//! - `types`: the value model shared by probes and submissions
//! - `manifest`: what a submission publishes, and how it is resolved
//! - `prober`: type lookup, member search, construction, invocation
//! - `predicates`: member-matching rules used by the checklists
//! - `concurrency`: the bounded many-caller identity probe
//! - `checklist`: the per-pattern check items
//! - `system`: stages, chain presets and the pipeline
//! - `result`: check entries, the merge algebra and scoring
//! - `reference`: in-process reference submissions
//!
//! ## Architectural Constraints
//!
//! - Every probe failure is data: no check item can abort the run
//! - Scoring is integer-only
//! - Has NO async, NO network, NO file I/O (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod checklist;
pub mod concurrency;
pub mod config;
pub mod manifest;
pub mod predicates;
pub mod prober;
pub mod reference;
pub mod result;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    GradeError, Instance, ParamKind, ProbeError, Raised, TypeKind, Value, Visibility,
};

// =============================================================================
// RE-EXPORTS: Manifest and Prober
// =============================================================================

pub use manifest::{
    ArtifactLoader, ConstructorDescriptor, Manifest, ManifestRegistry, MemberDescriptor,
    TypeDescriptor,
};
pub use predicates::{MemberPredicate, matcher};
pub use prober::{MemberHandle, MemberInfo, Prober, SharedAccessor, TypeHandle};

// =============================================================================
// RE-EXPORTS: Grading
// =============================================================================

pub use checklist::{CheckItem, Checklist, ProbeContext, Verdict};
pub use concurrency::{ConcurrencyOutcome, ConcurrencyProbe};
pub use config::{
    CommandConfig, FactoryConfig, GradingConfig, IntegrationConfig, ObserverConfig,
    SingletonConfig,
};
pub use result::{CheckEntry, GradeResult, MergePolicy, Outcome};

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::{BASE_LABEL, ChainPreset, Pipeline, Stage, StageKind, stepped_grading};
