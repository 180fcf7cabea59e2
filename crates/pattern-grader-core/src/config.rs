//! # Grading Configuration
//!
//! Every type name, candidate list, token and concurrency constant the
//! checklists use. All fields have defaults, so an empty document (or no
//! document at all) yields the standard grading run.
//!
//! The core never reads files; the application deserializes this from TOML.

use crate::concurrency::{DEFAULT_CALLERS, DEFAULT_TIMEOUT_MS};
use crate::result::MergePolicy;
use crate::types::GradeError;
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

// =============================================================================
// FACTORY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// The capability (product) interface.
    pub capability: String,
    /// The creator type.
    pub factory: String,
    /// Names of the concrete products to look for.
    pub candidates: Vec<String>,
    /// Tokens driven through the creator.
    pub tokens: Vec<String>,
    /// A token no creator should recognize.
    pub unknown_token: String,
    pub min_implementations: usize,
    pub min_created: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            capability: "Processor".to_string(),
            factory: "ProcessorFactory".to_string(),
            candidates: strings(&[
                "DataProcessor",
                "ComputeProcessor",
                "IOProcessor",
                "BadDataProcessor",
                "BadComputeProcessor",
                "BadIOProcessor",
                "DataProcessingStrategy",
                "ComputeProcessingStrategy",
                "IOProcessingStrategy",
            ]),
            tokens: strings(&["DATA", "COMPUTE", "IO", "data", "compute", "io"]),
            unknown_token: "UNKNOWN_TYPE".to_string(),
            min_implementations: 3,
            min_created: 2,
        }
    }
}

// =============================================================================
// SINGLETON
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingletonConfig {
    pub target: String,
    pub callers: usize,
    pub timeout_ms: u64,
    /// Member names that never count as the type's own behavior.
    pub default_members: Vec<String>,
}

impl Default for SingletonConfig {
    fn default() -> Self {
        Self {
            target: "NodeManager".to_string(),
            callers: DEFAULT_CALLERS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_members: strings(&[
                "hashCode",
                "equals",
                "toString",
                "wait",
                "notify",
                "notifyAll",
                "getClass",
            ]),
        }
    }
}

// =============================================================================
// OBSERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub capability: String,
    pub event: String,
    pub publisher: String,
    /// Concrete observers expected to implement the capability.
    pub observers: Vec<String>,
    /// Name fragments the event's accessors should cover.
    pub event_accessors: Vec<String>,
    pub min_accessors: usize,
    pub subscribe_names: Vec<String>,
    pub unsubscribe_names: Vec<String>,
    pub publish_names: Vec<String>,
    pub min_observers: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            capability: "EventObserver".to_string(),
            event: "ProcessEvent".to_string(),
            publisher: "EventPublisher".to_string(),
            observers: strings(&["LoggingObserver", "AlertingObserver"]),
            event_accessors: strings(&["id", "type", "message", "time"]),
            min_accessors: 4,
            subscribe_names: strings(&["add", "register", "subscribe"]),
            unsubscribe_names: strings(&["remove", "unregister", "unsubscribe"]),
            publish_names: strings(&["publish", "notify", "fire"]),
            min_observers: 2,
        }
    }
}

// =============================================================================
// COMMAND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub capability: String,
    pub concrete: String,
    pub invoker: String,
    /// Zero-argument members the capability must declare.
    pub required_members: Vec<String>,
    pub execute_names: Vec<String>,
    pub undo_names: Vec<String>,
    pub history_names: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            capability: "Command".to_string(),
            concrete: "ProcessCommand".to_string(),
            invoker: "CommandInvoker".to_string(),
            required_members: strings(&["execute", "undo", "getDescription", "getCommandId"]),
            execute_names: strings(&["execute"]),
            undo_names: strings(&["undo"]),
            history_names: strings(&["history", "get"]),
        }
    }
}

// =============================================================================
// INTEGRATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub tokens: Vec<String>,
    /// Input handed to the product created for the token at the same index.
    pub inputs: Vec<String>,
    /// Member names tried, in order, to drive a product.
    pub process_names: Vec<String>,
    pub min_completed: usize,
    /// Share of behavioral types that must be present, in percent.
    pub completeness_percent: u32,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            tokens: strings(&["DATA", "COMPUTE", "IO"]),
            inputs: strings(&["test data", "performance metrics", "log files"]),
            process_names: strings(&["process", "processData", "compute", "performIO"]),
            min_completed: 2,
            completeness_percent: 80,
        }
    }
}

// =============================================================================
// GRADING CONFIG
// =============================================================================

/// Complete configuration for one grading run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub merge_policy: MergePolicy,
    pub factory: FactoryConfig,
    pub singleton: SingletonConfig,
    pub observer: ObserverConfig,
    pub command: CommandConfig,
    pub integration: IntegrationConfig,
}

impl GradingConfig {
    /// Reject configurations no submission could pass.
    pub fn validate(&self) -> Result<(), GradeError> {
        let names = [
            ("factory.capability", &self.factory.capability),
            ("factory.factory", &self.factory.factory),
            ("singleton.target", &self.singleton.target),
            ("observer.capability", &self.observer.capability),
            ("observer.event", &self.observer.event),
            ("observer.publisher", &self.observer.publisher),
            ("command.capability", &self.command.capability),
            ("command.concrete", &self.command.concrete),
            ("command.invoker", &self.command.invoker),
        ];
        if let Some((field, _)) = names.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(GradeError::Config(format!("{field} must not be blank")));
        }

        if self.factory.tokens.is_empty() {
            return Err(GradeError::Config("factory.tokens must not be empty".into()));
        }
        if self.factory.min_created > self.factory.tokens.len() {
            return Err(GradeError::Config(format!(
                "factory.min_created ({}) exceeds the number of tokens ({})",
                self.factory.min_created,
                self.factory.tokens.len()
            )));
        }
        if self.integration.tokens.len() != self.integration.inputs.len() {
            return Err(GradeError::Config(format!(
                "integration.tokens ({}) and integration.inputs ({}) must pair up",
                self.integration.tokens.len(),
                self.integration.inputs.len()
            )));
        }
        if self.integration.min_completed > self.integration.tokens.len() {
            return Err(GradeError::Config(format!(
                "integration.min_completed ({}) exceeds the number of tokens ({})",
                self.integration.min_completed,
                self.integration.tokens.len()
            )));
        }
        if self.integration.completeness_percent > 100 {
            return Err(GradeError::Config(
                "integration.completeness_percent must be at most 100".into(),
            ));
        }
        if self.singleton.callers == 0 || self.singleton.timeout_ms == 0 {
            return Err(GradeError::Config(
                "singleton.callers and singleton.timeout_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GradingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.singleton.callers, 50);
        assert_eq!(config.singleton.timeout_ms, 10_000);
        assert_eq!(config.factory.tokens.len(), 6);
        assert_eq!(config.merge_policy, MergePolicy::AppendOnly);
    }

    #[test]
    fn blank_type_name_rejected() {
        let mut config = GradingConfig::default();
        config.singleton.target = "  ".to_string();
        let err = config.validate().expect_err("blank target");
        assert!(err.to_string().contains("singleton.target"));
    }

    #[test]
    fn unpaired_integration_inputs_rejected() {
        let mut config = GradingConfig::default();
        config.integration.inputs.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_created_bounded_by_tokens() {
        let mut config = GradingConfig::default();
        config.factory.tokens = vec!["ONLY".to_string()];
        assert!(config.validate().is_err());
    }
}
