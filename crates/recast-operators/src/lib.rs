#![forbid(unsafe_code)]
//! recast-operators: record operators and the aggregation engine.
//!
//! Design intent:
//! - Every operator is a pure `(collection, config) -> collection` function;
//!   configs are normalised into typed structs once, by [`registry`], before
//!   anything runs.
//! - Operators never mutate their input; they build a fresh collection.
//! - Sequence-only operators given a single record report a diagnostic and
//!   pass it through untouched.

pub mod aggregate;
pub mod args;
pub mod compute;
pub mod fields;
pub mod filter;
pub mod flatten;
pub mod format;
pub mod group;
pub mod mask;
pub mod project;
pub mod registry;
pub mod sequence;
pub mod sort;
pub mod text;
pub mod traits;
pub mod unwind;

pub use registry::OperatorKind;
pub use traits::{OpContext, OpError, Operator};
