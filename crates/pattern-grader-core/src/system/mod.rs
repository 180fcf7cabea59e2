//! # System Module
//!
//! The stage chain and the pipeline that runs it.
//!
//! Stages are links of a linear chain realized as an ordered list; the
//! pipeline folds their outcomes together with the configured merge policy.

mod pipeline;
mod stage;

pub use pipeline::*;
pub use stage::*;
