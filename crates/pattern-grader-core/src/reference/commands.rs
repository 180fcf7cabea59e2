//! Process commands and the invoker that runs and undoes them.

use super::{object_arg, receiver, text_arg};
use crate::manifest::{ConstructorDescriptor, MemberDescriptor, TypeDescriptor};
use crate::types::{Instance, ParamKind, Raised, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An encapsulated, reversible request.
pub trait Action: Send + Sync {
    fn execute(&self) -> String;
    fn undo(&self) -> String;
    fn description(&self) -> String;
    fn command_id(&self) -> String;
}

/// What every command instance wraps, so the invoker can run any of them.
#[derive(Clone)]
pub(crate) struct CommandHandle(Arc<dyn Action>);

/// Starts a named process at a priority.
#[derive(Debug)]
pub struct ProcessCommand {
    process: String,
    priority: i32,
    running: AtomicBool,
}

impl ProcessCommand {
    #[must_use]
    pub fn new(process: impl Into<String>, priority: i32) -> Self {
        Self {
            process: process.into(),
            priority,
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Action for ProcessCommand {
    fn execute(&self) -> String {
        self.running.store(true, Ordering::SeqCst);
        format!("Started process {} at priority {}", self.process, self.priority)
    }

    fn undo(&self) -> String {
        self.running.store(false, Ordering::SeqCst);
        format!("Stopped process {}", self.process)
    }

    fn description(&self) -> String {
        format!("Start process {} (priority {})", self.process, self.priority)
    }

    fn command_id(&self) -> String {
        format!("start-{}", self.process)
    }
}

/// Executes commands and keeps them for undo.
#[derive(Default)]
pub struct CommandInvoker {
    history: Mutex<Vec<CommandHandle>>,
}

impl CommandInvoker {
    fn execute(&self, command: CommandHandle) -> String {
        let outcome = command.0.execute();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        outcome
    }

    /// Undo the most recent command, if any.
    pub fn undo_last(&self) -> Option<String> {
        let last = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        last.map(|command| command.0.undo())
    }

    /// Descriptions of executed commands, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|command| command.0.description())
            .collect()
    }
}

fn command_member(name: &str, read: fn(&dyn Action) -> String) -> MemberDescriptor {
    MemberDescriptor::method(name).returns("String").body(move |this, _| {
        let command = receiver::<CommandHandle>(this, "Command")?;
        Ok(Value::Text(read(command.0.as_ref())))
    })
}

pub(super) fn types() -> Vec<TypeDescriptor> {
    let capability = ["execute", "undo", "getDescription", "getCommandId"]
        .into_iter()
        .fold(TypeDescriptor::interface("Command"), |ty, name| {
            ty.member(MemberDescriptor::method(name).returns("String"))
        });

    let concrete = TypeDescriptor::class("ProcessCommand")
        .implements("Command")
        .constructor(
            ConstructorDescriptor::public()
                .param(ParamKind::Text)
                .param(ParamKind::Integer)
                .body(|args| {
                    let priority = match args.get(1) {
                        Some(Value::Integer(priority)) => *priority,
                        _ => return Err(Raised::new("argument 1 must be a priority")),
                    };
                    let command = ProcessCommand::new(text_arg(args, 0)?, priority);
                    Ok(Instance::new("ProcessCommand", CommandHandle(Arc::new(command))))
                }),
        )
        .member(command_member("execute", |c| c.execute()))
        .member(command_member("undo", |c| c.undo()))
        .member(command_member("getDescription", |c| c.description()))
        .member(command_member("getCommandId", |c| c.command_id()));

    let invoker = TypeDescriptor::class("CommandInvoker")
        .constructor(
            ConstructorDescriptor::public()
                .body(|_| Ok(Instance::new("CommandInvoker", CommandInvoker::default()))),
        )
        .member(
            MemberDescriptor::method("executeCommand")
                .param(ParamKind::Object("Command".into()))
                .returns("String")
                .body(|this, args| {
                    let invoker = receiver::<CommandInvoker>(this, "CommandInvoker")?;
                    let command = object_arg::<CommandHandle>(args, 0, "Command")?.clone();
                    Ok(Value::Text(invoker.execute(command)))
                }),
        )
        .member(
            MemberDescriptor::method("undoLastCommand")
                .returns("String")
                .body(|this, _| {
                    let invoker = receiver::<CommandInvoker>(this, "CommandInvoker")?;
                    Ok(invoker.undo_last().map_or(Value::Absent, Value::Text))
                }),
        )
        .member(
            MemberDescriptor::method("getHistory")
                .returns("String")
                .body(|this, _| {
                    let invoker = receiver::<CommandInvoker>(this, "CommandInvoker")?;
                    Ok(Value::Text(invoker.history().join("; ")))
                }),
        );

    vec![capability, concrete, invoker]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoker_executes_and_undoes_in_reverse() {
        let invoker = CommandInvoker::default();
        let first = Arc::new(ProcessCommand::new("ingest", 1));
        let second = Arc::new(ProcessCommand::new("report", 2));

        invoker.execute(CommandHandle(first.clone()));
        assert_eq!(
            invoker.execute(CommandHandle(second.clone())),
            "Started process report at priority 2"
        );
        assert!(first.is_running() && second.is_running());
        assert_eq!(invoker.history().len(), 2);

        assert_eq!(invoker.undo_last().as_deref(), Some("Stopped process report"));
        assert!(!second.is_running());
        assert!(first.is_running());
        assert_eq!(invoker.history(), vec!["Start process ingest (priority 1)".to_string()]);
    }

    #[test]
    fn undo_on_empty_history_is_none() {
        assert_eq!(CommandInvoker::default().undo_last(), None);
    }
}
