//! Processor products and the factory that creates them.

use super::{receiver, text_arg};
use crate::manifest::{ConstructorDescriptor, MemberDescriptor, TypeDescriptor};
use crate::types::{Instance, ParamKind, Raised, Value};

/// The three processor categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Data,
    Compute,
    Io,
}

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 3] = [ProcessorKind::Data, ProcessorKind::Compute, ProcessorKind::Io];

    /// Parse a category token, ignoring case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "DATA" => Some(ProcessorKind::Data),
            "COMPUTE" => Some(ProcessorKind::Compute),
            "IO" => Some(ProcessorKind::Io),
            _ => None,
        }
    }

    /// Published type name of the product.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ProcessorKind::Data => "DataProcessor",
            ProcessorKind::Compute => "ComputeProcessor",
            ProcessorKind::Io => "IOProcessor",
        }
    }

    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            ProcessorKind::Data => "DATA",
            ProcessorKind::Compute => "COMPUTE",
            ProcessorKind::Io => "IO",
        }
    }
}

/// A product created by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorUnit {
    pub kind: ProcessorKind,
}

impl ProcessorUnit {
    #[must_use]
    pub fn process(&self, input: &str) -> String {
        match self.kind {
            ProcessorKind::Data => format!("Processed data: {} records", input.split_whitespace().count()),
            ProcessorKind::Compute => format!("Computed result for {} characters", input.chars().count()),
            ProcessorKind::Io => format!("IO operation completed on '{input}'"),
        }
    }

    fn into_instance(self) -> Instance {
        Instance::new(self.kind.type_name(), self)
    }
}

/// The creator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessorFactory;

impl ProcessorFactory {
    /// Create the product for a token; unknown tokens raise.
    pub fn create(&self, token: &str) -> Result<ProcessorUnit, Raised> {
        ProcessorKind::parse(token)
            .map(|kind| ProcessorUnit { kind })
            .ok_or_else(|| Raised::new(format!("Unknown processor type: {token}")))
    }
}

fn product_type(kind: ProcessorKind) -> TypeDescriptor {
    TypeDescriptor::class(kind.type_name())
        .implements("Processor")
        .constructor(
            ConstructorDescriptor::public().body(move |_| Ok(ProcessorUnit { kind }.into_instance())),
        )
        .member(
            MemberDescriptor::method("process")
                .param(ParamKind::Text)
                .returns("String")
                .body(|this, args| {
                    let unit = receiver::<ProcessorUnit>(this, "Processor")?;
                    Ok(Value::Text(unit.process(text_arg(args, 0)?)))
                }),
        )
        .member(
            MemberDescriptor::method("getType")
                .returns("String")
                .body(|this, _| {
                    let unit = receiver::<ProcessorUnit>(this, "Processor")?;
                    Ok(Value::Text(unit.kind.token().to_string()))
                }),
        )
}

pub(super) fn types() -> Vec<TypeDescriptor> {
    let capability = TypeDescriptor::interface("Processor")
        .member(
            MemberDescriptor::method("process")
                .param(ParamKind::Text)
                .returns("String"),
        )
        .member(MemberDescriptor::method("getType").returns("String"));

    let factory = TypeDescriptor::class("ProcessorFactory")
        .constructor(
            ConstructorDescriptor::public().body(|_| Ok(Instance::new("ProcessorFactory", ProcessorFactory))),
        )
        .member(
            MemberDescriptor::method("createProcessor")
                .param(ParamKind::Text)
                .returns("Processor")
                .body(|this, args| {
                    let factory = receiver::<ProcessorFactory>(this, "ProcessorFactory")?;
                    let unit = factory.create(text_arg(args, 0)?)?;
                    Ok(Value::Object(unit.into_instance()))
                }),
        );

    let mut types = vec![capability, factory];
    types.extend(ProcessorKind::ALL.into_iter().map(product_type));
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_ignore_case() {
        assert_eq!(ProcessorKind::parse("data"), Some(ProcessorKind::Data));
        assert_eq!(ProcessorKind::parse(" Io "), Some(ProcessorKind::Io));
        assert_eq!(ProcessorKind::parse("UNKNOWN_TYPE"), None);
    }

    #[test]
    fn factory_raises_on_unknown() {
        let err = ProcessorFactory.create("UNKNOWN_TYPE").expect_err("unknown");
        assert_eq!(err.to_string(), "Unknown processor type: UNKNOWN_TYPE");
    }

    #[test]
    fn products_process_input() {
        let unit = ProcessorFactory.create("COMPUTE").expect("compute");
        assert_eq!(unit.process("abc"), "Computed result for 3 characters");
        assert_eq!(unit.kind.type_name(), "ComputeProcessor");
    }
}
