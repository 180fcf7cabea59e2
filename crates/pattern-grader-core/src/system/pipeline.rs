//! # Grading Pipeline
//!
//! Assembles the stage chain and runs it once per grading run.
//!
//! The chain is an ordered list: each stage's inner result is everything the
//! stages before it produced, its own checklist runs unconditionally, and the
//! configured [`MergePolicy`](crate::MergePolicy) combines the two. The manifest is loaded fresh
//! for every run and dropped when the run ends.

use super::stage::{Stage, StageKind};
use crate::checklist::ProbeContext;
use crate::config::GradingConfig;
use crate::manifest::{ArtifactLoader, Manifest};
use crate::prober::Prober;
use crate::result::GradeResult;
use crate::types::GradeError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

// =============================================================================
// CHAIN PRESETS
// =============================================================================

/// Which stages a pipeline runs. The base stage always comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPreset {
    #[default]
    Full,
    /// Factory and singleton.
    Creational,
    /// Observer and command.
    Behavioral,
    FactoryOnly,
    SingletonOnly,
    ObserverOnly,
    CommandOnly,
    IntegrationOnly,
}

impl ChainPreset {
    /// Steps of a stepped grading run, in order.
    pub const STEPS: [ChainPreset; 6] = [
        ChainPreset::FactoryOnly,
        ChainPreset::SingletonOnly,
        ChainPreset::ObserverOnly,
        ChainPreset::CommandOnly,
        ChainPreset::IntegrationOnly,
        ChainPreset::Full,
    ];

    /// Stage kinds in chain order, base included.
    #[must_use]
    pub fn stages(&self) -> Vec<StageKind> {
        let own = match self {
            ChainPreset::Full => StageKind::ALL[1..].to_vec(),
            ChainPreset::Creational => vec![StageKind::Factory, StageKind::Singleton],
            ChainPreset::Behavioral => vec![StageKind::Observer, StageKind::Command],
            ChainPreset::FactoryOnly => vec![StageKind::Factory],
            ChainPreset::SingletonOnly => vec![StageKind::Singleton],
            ChainPreset::ObserverOnly => vec![StageKind::Observer],
            ChainPreset::CommandOnly => vec![StageKind::Command],
            ChainPreset::IntegrationOnly => vec![StageKind::Integration],
        };
        std::iter::once(StageKind::Base).chain(own).collect()
    }

    /// Name as accepted on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ChainPreset::Full => "full",
            ChainPreset::Creational => "creational",
            ChainPreset::Behavioral => "behavioral",
            ChainPreset::FactoryOnly => "factory-only",
            ChainPreset::SingletonOnly => "singleton-only",
            ChainPreset::ObserverOnly => "observer-only",
            ChainPreset::CommandOnly => "command-only",
            ChainPreset::IntegrationOnly => "integration-only",
        }
    }
}

impl std::fmt::Display for ChainPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// A stage chain plus the configuration its checklists read.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: GradingConfig,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// The full chain.
    #[must_use]
    pub fn new(config: GradingConfig) -> Self {
        Self::with_preset(config, ChainPreset::Full)
    }

    #[must_use]
    pub fn with_preset(config: GradingConfig, preset: ChainPreset) -> Self {
        Self {
            config,
            stages: preset.stages().into_iter().map(Stage::new).collect(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage labels joined in chain order, e.g. `Basic Validation + Factory Pattern`.
    #[must_use]
    pub fn category(&self) -> String {
        self.stages
            .iter()
            .map(Stage::label)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Scored items a run of this pipeline records (before any prior-failure flags).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.stages.iter().map(Stage::item_count).sum()
    }

    /// Grade an already loaded manifest.
    pub fn grade_manifest(&self, manifest: Arc<Manifest>) -> GradeResult {
        let started = Instant::now();
        let prober = Prober::new(manifest);
        let ctx = ProbeContext::new(&prober, &self.config);
        let policy = self.config.merge_policy;

        tracing::info!(
            namespace = prober.namespace(),
            category = %self.category(),
            "Grading started"
        );

        let mut result = self
            .stages
            .iter()
            .fold(GradeResult::new(), |inner, stage| {
                let own = stage.run(&ctx);
                policy.merge(inner, own, stage.label())
            });
        result.set_elapsed_ms(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));

        tracing::info!(
            namespace = prober.namespace(),
            passed = result.passed_count(),
            failed = result.failed_count(),
            score = %result.score_display(),
            elapsed_ms = result.elapsed_ms(),
            "Grading finished"
        );
        result
    }

    /// Resolve `namespace` through `loader` and grade it.
    ///
    /// Resolution failures are returned before any stage runs.
    pub fn grade(
        &self,
        loader: &dyn ArtifactLoader,
        namespace: &str,
    ) -> Result<GradeResult, GradeError> {
        self.config.validate()?;
        let manifest = loader.load(namespace)?;
        Ok(self.grade_manifest(manifest))
    }

    /// Like [`Pipeline::grade`], substituting a terminal failure result on error.
    pub fn grade_or_terminal(&self, loader: &dyn ArtifactLoader, namespace: &str) -> GradeResult {
        self.grade(loader, namespace).unwrap_or_else(|err| {
            tracing::warn!(namespace, error = %err, "Grading could not start");
            GradeResult::terminal_failure(&err)
        })
    }
}

/// Grade each pattern area on its own, then everything together.
///
/// Every step loads a fresh manifest.
pub fn stepped_grading(
    loader: &dyn ArtifactLoader,
    namespace: &str,
    config: &GradingConfig,
) -> Vec<(ChainPreset, GradeResult)> {
    ChainPreset::STEPS
        .iter()
        .map(|preset| {
            let pipeline = Pipeline::with_preset(config.clone(), *preset);
            (*preset, pipeline.grade_or_terminal(loader, namespace))
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestRegistry;
    use crate::result::MergePolicy;

    #[test]
    fn full_chain_order_and_category() {
        let pipeline = Pipeline::new(GradingConfig::default());
        assert_eq!(
            pipeline.category(),
            "Basic Validation + Factory Pattern + Singleton Pattern + Observer Pattern + Command Pattern + Integration Tests"
        );
        assert_eq!(pipeline.item_count(), 25);
    }

    #[test]
    fn presets_always_start_with_base() {
        for preset in ChainPreset::STEPS {
            assert_eq!(preset.stages()[0], StageKind::Base);
        }
        assert_eq!(
            ChainPreset::Creational.stages(),
            vec![StageKind::Base, StageKind::Factory, StageKind::Singleton]
        );
    }

    #[test]
    fn unresolvable_namespace_is_returned() {
        let pipeline = Pipeline::new(GradingConfig::default());
        let registry = ManifestRegistry::new();
        assert!(matches!(
            pipeline.grade(&registry, ""),
            Err(GradeError::InvalidNamespace(_))
        ));

        let terminal = pipeline.grade_or_terminal(&registry, "nobody");
        assert_eq!(terminal.total(), 1);
        assert!(!terminal.passed());
    }

    #[test]
    fn invalid_config_is_returned() {
        let mut config = GradingConfig::default();
        config.factory.factory = String::new();
        let registry = ManifestRegistry::new().with("x", || Manifest::new("x"));
        assert!(matches!(
            Pipeline::new(config).grade(&registry, "x"),
            Err(GradeError::Config(_))
        ));
    }

    #[test]
    fn flag_policy_marks_each_stage_after_a_failure() {
        let config = GradingConfig {
            merge_policy: MergePolicy::FlagPriorFailure,
            ..GradingConfig::default()
        };
        let pipeline = Pipeline::with_preset(config, ChainPreset::Behavioral);
        let result = pipeline.grade_manifest(Arc::new(Manifest::new("empty")));

        // Observer (5) + one flag before Command + Command (4).
        assert_eq!(result.total(), 10);
        assert_eq!(result.entries()[5].message, MergePolicy::PRIOR_FAILURE);
    }

    #[test]
    fn stepped_grading_runs_every_step() {
        let registry = ManifestRegistry::new().with("x", || Manifest::new("x"));
        let steps = stepped_grading(&registry, "x", &GradingConfig::default());
        let presets: Vec<_> = steps.iter().map(|(preset, _)| *preset).collect();
        assert_eq!(presets, ChainPreset::STEPS.to_vec());
        assert_eq!(steps[0].1.total(), 5);
        assert_eq!(steps[5].1.total(), 25);
    }
}
