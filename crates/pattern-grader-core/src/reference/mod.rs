//! # Reference Submissions
//!
//! Complete, in-process submissions that publish their manifests the way a
//! real submission would.
//!
//! - [`COMPLETE`]: satisfies every checklist item.
//! - [`UNSAFE_SINGLETON`]: identical, except the node manager's accessor
//!   hands out a fresh instance on every call.
//!
//! Each load builds fresh state (including the single node manager), so
//! repeated grading runs never observe each other.

mod commands;
mod events;
mod nodes;
mod processing;

pub use commands::{Action, CommandInvoker, ProcessCommand};
pub use events::{AlertingObserver, EventPublisher, EventSink, LoggingObserver, ProcessEvent};
pub use nodes::NodeManager;
pub use processing::{ProcessorFactory, ProcessorKind, ProcessorUnit};

use crate::manifest::{Manifest, ManifestRegistry, TypeDescriptor};
use crate::types::{Instance, Raised, Value};

/// Namespace of the complete reference submission.
pub const COMPLETE: &str = "reference.complete";

/// Namespace of the variant whose single instance is not single.
pub const UNSAFE_SINGLETON: &str = "reference.unsafe";

/// Registry holding both reference submissions.
#[must_use]
pub fn registry() -> ManifestRegistry {
    ManifestRegistry::new()
        .with(COMPLETE, complete)
        .with(UNSAFE_SINGLETON, unsafe_singleton)
}

/// The complete reference submission.
#[must_use]
pub fn complete() -> Manifest {
    assemble(Manifest::new(COMPLETE), nodes::cached_type())
}

/// The reference submission with a fresh-instance accessor.
#[must_use]
pub fn unsafe_singleton() -> Manifest {
    assemble(Manifest::new(UNSAFE_SINGLETON), nodes::fresh_type())
}

fn assemble(manifest: Manifest, node_manager: TypeDescriptor) -> Manifest {
    processing::types()
        .into_iter()
        .chain(std::iter::once(node_manager))
        .chain(events::types())
        .chain(commands::types())
        .fold(manifest, Manifest::with_type)
}

// =============================================================================
// BODY HELPERS
// =============================================================================

/// Borrow the receiver as `T`, or raise.
pub(crate) fn receiver<'a, T: 'static>(
    this: Option<&'a Instance>,
    expected: &str,
) -> Result<&'a T, Raised> {
    this.and_then(Instance::downcast_ref::<T>)
        .ok_or_else(|| Raised::new(format!("receiver is not a {expected}")))
}

/// Text argument at `index`, or raise.
pub(crate) fn text_arg<'a>(args: &'a [Value], index: usize) -> Result<&'a str, Raised> {
    args.get(index)
        .and_then(Value::as_text)
        .ok_or_else(|| Raised::new(format!("argument {index} must be text")))
}

/// Object argument at `index` borrowed as `T`, or raise.
pub(crate) fn object_arg<'a, T: 'static>(
    args: &'a [Value],
    index: usize,
    expected: &str,
) -> Result<&'a T, Raised> {
    args.get(index)
        .and_then(Value::as_instance)
        .and_then(Instance::downcast_ref::<T>)
        .ok_or_else(|| Raised::new(format!("argument {index} must be a {expected}")))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ArtifactLoader;

    #[test]
    fn registry_lists_both_namespaces() {
        assert_eq!(
            registry().namespaces(),
            vec![COMPLETE.to_string(), UNSAFE_SINGLETON.to_string()]
        );
    }

    #[test]
    fn complete_publishes_every_pattern_type() {
        let manifest = complete();
        for name in [
            "Processor",
            "ProcessorFactory",
            "DataProcessor",
            "ComputeProcessor",
            "IOProcessor",
            "NodeManager",
            "EventObserver",
            "ProcessEvent",
            "EventPublisher",
            "LoggingObserver",
            "AlertingObserver",
            "Command",
            "ProcessCommand",
            "CommandInvoker",
        ] {
            assert!(manifest.get(name).is_some(), "{name} missing");
        }
        assert!(manifest.is_assignable("IOProcessor", "Processor"));
        assert!(manifest.is_assignable("ProcessCommand", "Command"));
    }
}
