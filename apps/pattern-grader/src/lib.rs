//! # pattern-grader
//!
//! Application layer around `pattern-grader-core`: command-line parsing,
//! configuration loading and report output.

pub mod cli;
pub mod report;
