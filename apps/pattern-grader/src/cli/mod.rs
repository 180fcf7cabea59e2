//! # Pattern Grader CLI Module
//!
//! ## Available Commands
//!
//! - `grade` - Grade one namespace and write the report file
//! - `stepped` - Grade each pattern area separately, then everything
//! - `list` - List the namespaces the registry can resolve

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use pattern_grader_core::{ChainPreset, GradeError, reference};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pattern Grader
///
/// Probes a submission's published types and grades its use of the
/// factory, single-instance, observer and command patterns.
#[derive(Parser, Debug)]
#[command(name = "pattern-grader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress the console summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Grade a namespace and write results.pass / results.fail
    Grade {
        /// Namespace of the submission
        #[arg(default_value = reference::COMPLETE)]
        namespace: String,

        /// Directory receiving the report file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Which stages to run
        #[arg(short, long, value_enum, default_value_t = PresetArg::Full)]
        preset: PresetArg,

        /// TOML grading configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the result as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Grade each pattern area on its own, then the full chain
    Stepped {
        /// Namespace of the submission
        #[arg(default_value = reference::COMPLETE)]
        namespace: String,

        /// TOML grading configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List resolvable namespaces
    List,
}

/// Chain preset as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Full,
    Creational,
    Behavioral,
    FactoryOnly,
    SingletonOnly,
    ObserverOnly,
    CommandOnly,
    IntegrationOnly,
}

impl From<PresetArg> for ChainPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Full => ChainPreset::Full,
            PresetArg::Creational => ChainPreset::Creational,
            PresetArg::Behavioral => ChainPreset::Behavioral,
            PresetArg::FactoryOnly => ChainPreset::FactoryOnly,
            PresetArg::SingletonOnly => ChainPreset::SingletonOnly,
            PresetArg::ObserverOnly => ChainPreset::ObserverOnly,
            PresetArg::CommandOnly => ChainPreset::CommandOnly,
            PresetArg::IntegrationOnly => ChainPreset::IntegrationOnly,
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI; `Ok(true)` when the graded submission passed.
pub fn execute(cli: Cli) -> Result<bool, GradeError> {
    let quiet = cli.quiet;

    match cli.command {
        Some(Commands::Grade {
            namespace,
            output,
            preset,
            config,
            json,
        }) => cmd_grade(
            &namespace,
            &output,
            preset.into(),
            config.as_deref(),
            json,
            quiet,
        ),
        Some(Commands::Stepped { namespace, config }) => {
            cmd_stepped(&namespace, config.as_deref(), quiet)
        }
        Some(Commands::List) => cmd_list(),
        None => {
            // No subcommand - grade the complete reference
            cmd_grade(
                reference::COMPLETE,
                std::path::Path::new("."),
                ChainPreset::Full,
                None,
                false,
                quiet,
            )
        }
    }
}
