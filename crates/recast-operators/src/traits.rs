//! Operator trait + common interfaces.
//!
//! The executor builds each operator once from its step config (see
//! [`crate::registry`]), then calls [`Operator::apply`] with the evolving
//! collection and a per-step [`OpContext`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use recast_core::config::EngineConfig;
use recast_core::diag::{Diagnostic, DiagnosticSink};
use recast_core::types::{Collection, Record};
use recast_expr::ExprError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// Missing or malformed operator configuration. Fatal for the pipeline.
    #[error("{0}")]
    Config(String),
}

impl From<ExprError> for OpError {
    fn from(e: ExprError) -> Self {
        OpError::Config(e.to_string())
    }
}

/// Everything an operator may consult besides its own config.
pub struct OpContext<'a> {
    /// Index of the step being executed.
    pub step: usize,
    pub config: &'a EngineConfig,
    pub sink: &'a dyn DiagnosticSink,
    /// Wall-clock instant captured once per run.
    pub now: DateTime<Utc>,
}

impl<'a> OpContext<'a> {
    pub fn new(config: &'a EngineConfig, sink: &'a dyn DiagnosticSink, now: DateTime<Utc>) -> Self {
        Self {
            step: 0,
            config,
            sink,
            now,
        }
    }

    pub fn at_step(&self, step: usize) -> OpContext<'a> {
        OpContext {
            step,
            config: self.config,
            sink: self.sink,
            now: self.now,
        }
    }

    pub fn info(&self, op: &str, message: impl Into<String>) {
        self.sink
            .emit(Diagnostic::info(message).at(self.step, op));
    }

    pub fn warn(&self, op: &str, message: impl Into<String>) {
        self.sink
            .emit(Diagnostic::warn(message).at(self.step, op));
    }
}

/// Trait that all operators implement.
///
/// Invariants:
/// - `apply` must be deterministic given the same input, config, and clock.
/// - `apply` must not mutate `input`.
pub trait Operator: Send + Sync {
    /// Operator name as written in pipeline documents (stable).
    fn name(&self) -> &'static str;

    fn apply(&self, input: &Collection, ctx: &OpContext<'_>) -> Result<Collection, OpError>;
}

/// Run `f` over a sequence; a single record is reported and passed through.
pub fn sequence_only<F>(
    name: &'static str,
    input: &Collection,
    ctx: &OpContext<'_>,
    f: F,
) -> Result<Collection, OpError>
where
    F: FnOnce(&[Record]) -> Result<Vec<Record>, OpError>,
{
    match input {
        Collection::Many(records) => f(records).map(Collection::Many),
        Collection::Single(_) => {
            ctx.warn(
                name,
                format!("'{name}' requires a sequence of records; single record passed through unchanged"),
            );
            Ok(input.clone())
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for operator unit tests.

    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;
    use recast_core::diag::MemorySink;

    pub fn records(v: Value) -> Collection {
        Collection::from_value(v).unwrap()
    }

    pub fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    /// Apply `op` to `input`, returning the output and collected diagnostics.
    pub fn run(op: &dyn Operator, input: Value) -> (Value, Vec<String>) {
        let cfg = EngineConfig::default();
        let sink = MemorySink::new();
        let ctx = OpContext::new(&cfg, &sink, fixed_now());
        let out = op.apply(&records(input), &ctx).unwrap();
        (out.into_value(), sink.messages())
    }
}
