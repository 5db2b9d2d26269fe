#![forbid(unsafe_code)]
//! recast-planner: pipeline documents (YAML or JSON) → validated, compiled
//! step list.
//!
//! Design:
//! - `dsl` reads the document shape only: a `transforms` list of single-key
//!   mappings plus an optional `config` block. It knows nothing about
//!   individual operators.
//! - `compile` resolves every step name through
//!   `recast_operators::OperatorKind` and builds each operator up front, so a
//!   bad step fails before any record is touched.

pub mod compile;
pub mod dsl;

pub use compile::{CompiledStep, Pipeline};
pub use dsl::document::{parse_document, PipelineConfig, PipelineDocument, RawStep};
