//! # CLI Command Implementations

use crate::report::{self, ReportHeader};
use pattern_grader_core::{
    ArtifactLoader, ChainPreset, GradeError, GradingConfig, ManifestRegistry,
    Pipeline, reference, stepped_grading,
};
use std::path::Path;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SHARED SETUP
// =============================================================================

/// Every namespace the binary can resolve.
#[must_use]
pub fn registry() -> ManifestRegistry {
    reference::registry()
}

/// Load a TOML grading configuration; `None` gives the defaults.
///
/// Missing keys fall back to their defaults; the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<GradingConfig, GradeError> {
    let Some(path) = path else {
        return Ok(GradingConfig::default());
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        GradeError::Io(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(GradeError::Config(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        GradeError::Io(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    let config: GradingConfig = toml::from_str(&text)
        .map_err(|e| GradeError::Config(format!("Invalid config '{}': {}", path.display(), e)))?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Loaded grading config");
    Ok(config)
}

// =============================================================================
// GRADE COMMAND
// =============================================================================

/// Grade one namespace, write the report file, and print the summary.
///
/// An unresolvable namespace still produces a (failing) report.
pub fn cmd_grade(
    namespace: &str,
    output: &Path,
    preset: ChainPreset,
    config: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<bool, GradeError> {
    let config = load_config(config)?;
    let pipeline = Pipeline::with_preset(config, preset);
    let result = pipeline.grade_or_terminal(&registry(), namespace);

    let header = ReportHeader::new(namespace.trim(), pipeline.category());
    let path = report::write_report(output, &header, &result)?;

    if json {
        println!("{}", report::render_json(&header, &result)?);
    } else if !quiet {
        println!("{}", report::render_summary(&result));
        println!("Result file generated: {}", path.display());
    }

    Ok(result.passed())
}

// =============================================================================
// STEPPED COMMAND
// =============================================================================

/// Grade each pattern area separately, then the full chain.
pub fn cmd_stepped(namespace: &str, config: Option<&Path>, quiet: bool) -> Result<bool, GradeError> {
    let config = load_config(config)?;
    let steps = stepped_grading(&registry(), namespace, &config);

    if !quiet {
        println!("Stepped grading: {}", namespace.trim());
        println!("==================");
        for (preset, result) in &steps {
            println!("{:<18} {}", preset.name(), result);
        }
    }

    Ok(steps
        .last()
        .map(|(_, result)| result.passed())
        .unwrap_or(false))
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List resolvable namespaces.
pub fn cmd_list() -> Result<bool, GradeError> {
    for namespace in registry().namespaces() {
        println!("{namespace}");
    }
    Ok(true)
}
