//! The node manager: one shared registry of processing nodes.

use super::{receiver, text_arg};
use crate::manifest::{ConstructorDescriptor, MemberDescriptor, TypeDescriptor};
use crate::types::{Instance, ParamKind, Value, Visibility};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Registry of node names.
#[derive(Debug, Default)]
pub struct NodeManager {
    nodes: Mutex<Vec<String>>,
}

impl NodeManager {
    pub fn add_node(&self, name: &str) {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn fresh_instance() -> Instance {
    Instance::new("NodeManager", NodeManager::default())
}

/// Declaration shared by both variants; only the accessor differs.
fn declaration(accessor: MemberDescriptor) -> TypeDescriptor {
    TypeDescriptor::class("NodeManager")
        .constructor(ConstructorDescriptor::private().body(|_| Ok(fresh_instance())))
        .member(accessor)
        .member(
            MemberDescriptor::method("addNode")
                .param(ParamKind::Text)
                .body(|this, args| {
                    receiver::<NodeManager>(this, "NodeManager")?.add_node(text_arg(args, 0)?);
                    Ok(Value::Unit)
                }),
        )
        .member(
            MemberDescriptor::method("getNodeCount")
                .returns("int")
                .body(|this, _| {
                    let count = receiver::<NodeManager>(this, "NodeManager")?.node_count();
                    Ok(Value::Integer(i32::try_from(count).unwrap_or(i32::MAX)))
                }),
        )
        .member(
            MemberDescriptor::method("toString")
                .returns("String")
                .visibility(Visibility::Public)
                .inherited()
                .body(|this, _| {
                    let count = receiver::<NodeManager>(this, "NodeManager")?.node_count();
                    Ok(Value::Text(format!("NodeManager[{count} nodes]")))
                }),
        )
}

/// Accessor backed by one lazily created instance per manifest.
pub(super) fn cached_type() -> TypeDescriptor {
    let cell: Arc<OnceLock<Instance>> = Arc::new(OnceLock::new());
    declaration(
        MemberDescriptor::static_method("getInstance")
            .returns("NodeManager")
            .body(move |_, _| Ok(Value::Object(cell.get_or_init(fresh_instance).clone()))),
    )
}

/// Accessor that creates a new instance on every call.
pub(super) fn fresh_type() -> TypeDescriptor {
    declaration(
        MemberDescriptor::static_method("getInstance")
            .returns("NodeManager")
            .body(|_, _| Ok(Value::Object(fresh_instance()))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nodes() {
        let manager = NodeManager::default();
        manager.add_node("alpha");
        manager.add_node("beta");
        assert_eq!(manager.node_count(), 2);
    }
}
