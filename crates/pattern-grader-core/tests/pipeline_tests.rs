//! # Pipeline Tests
//!
//! End-to-end grading runs against the reference submissions and small
//! hand-built manifests.

use pattern_grader_core::reference::{self, COMPLETE, UNSAFE_SINGLETON};
use pattern_grader_core::{
    ChainPreset, ConstructorDescriptor, GradingConfig, Instance, Manifest, ManifestRegistry,
    MemberDescriptor, ParamKind, Pipeline, Raised, StageKind, TypeDescriptor, Value,
    stepped_grading,
};
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

/// A shape family whose factory answers unknown tokens with `unknown`.
fn shapes(unknown: fn(&str) -> Result<Value, Raised>) -> Manifest {
    let product = |name: &'static str| {
        TypeDescriptor::class(name)
            .implements("Shape")
            .constructor(ConstructorDescriptor::public().body(move |_| Ok(Instance::new(name, ()))))
            .member(MemberDescriptor::method("describe").returns("String"))
    };

    Manifest::new("shapes")
        .with_type(
            TypeDescriptor::interface("Shape")
                .member(MemberDescriptor::method("describe").returns("String")),
        )
        .with_type(
            TypeDescriptor::class("ShapeFactory").member(
                MemberDescriptor::static_method("createShape")
                    .param(ParamKind::Text)
                    .returns("Shape")
                    .body(move |_, args| {
                        let token = args.first().and_then(Value::as_text).unwrap_or_default();
                        let name = match token.to_ascii_uppercase().as_str() {
                            "CIRCLE" => "Circle",
                            "SQUARE" => "Square",
                            "TRIANGLE" => "Triangle",
                            _ => return unknown(token),
                        };
                        Ok(Value::Object(Instance::new(name, ())))
                    }),
            ),
        )
        .with_type(product("Circle"))
        .with_type(product("Square"))
        .with_type(product("Triangle"))
}

fn shape_config() -> GradingConfig {
    let mut config = GradingConfig::default();
    config.factory.capability = "Shape".to_string();
    config.factory.factory = "ShapeFactory".to_string();
    config.factory.candidates = vec!["Circle".into(), "Square".into(), "Triangle".into()];
    config.factory.tokens = vec!["CIRCLE".into(), "SQUARE".into(), "TRIANGLE".into()];
    config.factory.unknown_token = "HEXAGON".to_string();
    config
}

fn small_probe_config() -> GradingConfig {
    let mut config = GradingConfig::default();
    config.singleton.callers = 16;
    config
}

// =============================================================================
// REFERENCE SUBMISSIONS
// =============================================================================

#[test]
fn complete_reference_passes_every_item() {
    let pipeline = Pipeline::new(small_probe_config());
    let result = pipeline
        .grade(&reference::registry(), COMPLETE)
        .expect("reference resolves");

    let failures: Vec<String> = result.failures().map(ToString::to_string).collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(result.total(), 25);
    assert!(result.passed());
    assert_eq!(result.score_display(), "100.0%");
}

#[test]
fn complete_reference_passes_repeatedly() {
    let pipeline = Pipeline::with_preset(small_probe_config(), ChainPreset::SingletonOnly);
    for _ in 0..3 {
        let result = pipeline
            .grade(&reference::registry(), COMPLETE)
            .expect("reference resolves");
        assert!(result.passed(), "{result}");
    }
}

#[test]
fn fresh_instance_accessor_fails_identity_items() {
    let pipeline = Pipeline::with_preset(small_probe_config(), ChainPreset::SingletonOnly);
    let result = pipeline
        .grade(&reference::registry(), UNSAFE_SINGLETON)
        .expect("reference resolves");

    assert_eq!(result.total(), 6);
    assert_eq!(result.failed_count(), 2);
    assert!(!result.entries()[3].is_pass());
    assert!(!result.entries()[4].is_pass());
    assert!(result.entries()[4].message.contains("not thread-safe"));
}

#[test]
fn namespace_whitespace_is_trimmed() {
    let pipeline = Pipeline::with_preset(small_probe_config(), ChainPreset::FactoryOnly);
    let result = pipeline
        .grade(&reference::registry(), &format!("  {COMPLETE} "))
        .expect("trimmed namespace resolves");
    assert!(result.passed());
}

// =============================================================================
// HAND-BUILT SUBMISSIONS
// =============================================================================

#[test]
fn renamed_factory_family_passes_with_config_override() {
    let pipeline = Pipeline::with_preset(shape_config(), ChainPreset::FactoryOnly);
    let result = pipeline.grade_manifest(Arc::new(shapes(|_| Ok(Value::Absent))));

    assert_eq!(result.total(), 5);
    assert!(result.passed(), "{result}");
}

#[test]
#[allow(clippy::panic)]
fn unknown_token_may_panic() {
    let pipeline = Pipeline::with_preset(shape_config(), ChainPreset::FactoryOnly);
    let result = pipeline.grade_manifest(Arc::new(shapes(|token| panic!("no shape for {token}"))));

    assert_eq!(result.total(), 5);
    assert!(result.entries()[4].is_pass(), "{}", result.entries()[4].message);
}

#[test]
fn unconstructible_implementation_fails_implementation_item() {
    let broken = TypeDescriptor::class("BadShape")
        .implements("Shape")
        .constructor(ConstructorDescriptor::public().body(|_| Err(Raised::new("no default size"))))
        .member(MemberDescriptor::method("describe").returns("String"));
    let manifest = shapes(|_| Ok(Value::Absent)).with_type(broken);
    let mut config = shape_config();
    config.factory.candidates.push("BadShape".into());

    let result = Pipeline::with_preset(config, ChainPreset::FactoryOnly).grade_manifest(Arc::new(manifest));

    let item = &result.entries()[2];
    assert!(!item.is_pass());
    assert!(item.message.contains("Cannot instantiate BadShape"), "{}", item.message);
    assert_eq!(result.failed_count(), 1);
}

#[test]
fn unknown_token_may_raise() {
    let pipeline = Pipeline::with_preset(shape_config(), ChainPreset::FactoryOnly);
    let result = pipeline.grade_manifest(Arc::new(shapes(|token| {
        Err(Raised::new(format!("Unknown shape: {token}")))
    })));

    assert!(result.entries()[4].is_pass());
    assert!(
        result
            .details()
            .iter()
            .any(|detail| detail.contains("Unknown shape: HEXAGON"))
    );
}

#[test]
fn products_driven_through_any_text_member() {
    let product = |name: &'static str| {
        TypeDescriptor::class(name)
            .implements("Processor")
            .constructor(ConstructorDescriptor::public().body(move |_| Ok(Instance::new(name, ()))))
            .member(
                MemberDescriptor::method("handle")
                    .param(ParamKind::Text)
                    .returns("String")
                    .body(move |_, args| {
                        let input = args.first().and_then(Value::as_text).unwrap_or_default();
                        Ok(Value::Text(format!("{name} handled {input}")))
                    }),
            )
    };
    let manifest = Manifest::new("processors")
        .with_type(TypeDescriptor::interface("Processor"))
        .with_type(
            TypeDescriptor::class("ProcessorFactory").member(
                MemberDescriptor::static_method("createProcessor")
                    .param(ParamKind::Text)
                    .returns("Processor")
                    .body(|_, args| {
                        let name = match args.first().and_then(Value::as_text) {
                            Some("DATA") => "DataProcessor",
                            Some("COMPUTE") => "ComputeProcessor",
                            Some("IO") => "IOProcessor",
                            _ => return Ok(Value::Absent),
                        };
                        Ok(Value::Object(Instance::new(name, ())))
                    }),
            ),
        )
        .with_type(product("DataProcessor"))
        .with_type(product("ComputeProcessor"))
        .with_type(product("IOProcessor"));

    let pipeline = Pipeline::with_preset(GradingConfig::default(), ChainPreset::IntegrationOnly);
    let result = pipeline.grade_manifest(Arc::new(manifest));

    let scenario = &result.entries()[2];
    assert!(scenario.is_pass(), "{}", scenario.message);
    assert!(scenario.message.contains("3/3"));
}

#[test]
fn empty_submission_fails_every_item() {
    let result = Pipeline::new(small_probe_config()).grade_manifest(Arc::new(Manifest::new("empty")));

    assert_eq!(result.total(), 25);
    assert_eq!(result.passed_count(), 0);
    assert_eq!(result.score_tenths(), 0);
    assert!(!result.passed());
}

#[test]
fn unknown_namespace_does_not_run_stages() {
    let pipeline = Pipeline::new(GradingConfig::default());
    let result = pipeline.grade_or_terminal(&ManifestRegistry::new(), "student.week02");

    assert_eq!(result.total(), 1);
    assert!(result.entries()[0].message.starts_with("Grading could not start"));
    assert!(result.details().is_empty());
}

// =============================================================================
// CHAIN SHAPE
// =============================================================================

#[test]
fn total_matches_sum_of_stage_items() {
    let manifest = Arc::new(Manifest::new("empty"));
    for preset in ChainPreset::STEPS
        .into_iter()
        .chain([ChainPreset::Creational, ChainPreset::Behavioral])
    {
        let pipeline = Pipeline::with_preset(small_probe_config(), preset);
        let expected: usize = preset
            .stages()
            .into_iter()
            .map(|kind| kind.checklist().len())
            .sum();
        assert_eq!(pipeline.item_count(), expected);
        assert_eq!(pipeline.grade_manifest(manifest.clone()).total(), expected, "{preset}");
    }
}

#[test]
fn stage_details_follow_chain_order() {
    let pipeline = Pipeline::with_preset(small_probe_config(), ChainPreset::Creational);
    let result = pipeline.grade_manifest(Arc::new(Manifest::new("empty")));

    let banners: Vec<&String> = result
        .details()
        .iter()
        .filter(|detail| detail.starts_with("Starting"))
        .collect();
    assert_eq!(banners.len(), 3);
    assert!(banners[0].contains("namespace empty"));
    assert_eq!(banners[1], &format!("Starting {} validation", StageKind::Factory.label()));
    assert_eq!(banners[2], &format!("Starting {} validation", StageKind::Singleton.label()));
}

#[test]
fn stepped_grading_ends_with_the_full_chain() {
    let steps = stepped_grading(&reference::registry(), COMPLETE, &small_probe_config());

    assert_eq!(steps.len(), ChainPreset::STEPS.len());
    for (preset, result) in &steps {
        assert!(result.passed(), "{preset}: {result}");
    }
    assert_eq!(steps.last().map(|(_, r)| r.total()), Some(25));
}
