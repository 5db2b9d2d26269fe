//! Runtime: apply a compiled [`Pipeline`] to a collection and emit a
//! [`RunManifest`].
//!
//! Behavior:
//! - The input must be a record or a list of records.
//! - The pipeline's `config` block is layered over the engine config.
//! - The clock is read once per run, so `$now`-style values agree across
//!   records.
//! - Diagnostics go to the injected sink; the run itself is traced with a
//!   span per run and a debug event per step.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use recast_core::config::EngineConfig;
use recast_core::diag::{DiagnosticSink, TracingSink};
use recast_core::error::{Error, Result};
use recast_core::hash::hash_value;
use recast_core::manifest::{RunManifest, StepStats};
use recast_core::types::Collection;
use recast_operators::{OpContext, OpError};
use recast_planner::Pipeline;

use crate::state::RunState;

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub output: Value,
    pub manifest: RunManifest,
}

/// Engine owns the base config, the diagnostic sink, and an optional fixed
/// clock.
pub struct Engine {
    cfg: EngineConfig,
    sink: Arc<dyn DiagnosticSink>,
    clock: Option<DateTime<Utc>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            sink: Arc::new(TracingSink),
            clock: None,
        }
    }

    /// Route diagnostics to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Pin the run clock used by `set` (`$now`, `$today`, `$timestamp`).
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Parse and compile `src` against this engine's config.
    pub fn compile(&self, src: &str) -> Result<Pipeline> {
        Pipeline::parse(src, &self.cfg)
    }

    /// Compile `src` and run it over `input`.
    pub fn run_source(&self, src: &str, input: &Value) -> Result<RunOutput> {
        let pipeline = self.compile(src)?;
        self.run(&pipeline, input)
    }

    /// Execute `pipeline` over `input`.
    pub fn run(&self, pipeline: &Pipeline, input: &Value) -> Result<RunOutput> {
        let mut state = RunState::Idle;
        self.run_tracked(pipeline, input, &mut state)
    }

    /// Same as [`Engine::run`], leaving the final [`RunState`] in `state`.
    pub(crate) fn run_tracked(
        &self,
        pipeline: &Pipeline,
        input: &Value,
        state: &mut RunState,
    ) -> Result<RunOutput> {
        let cfg = pipeline.engine_config(&self.cfg);
        let now = self.clock.unwrap_or_else(Utc::now);
        let mut manifest =
            RunManifest::new(pipeline.fingerprint(), hash_value(input), now_millis());

        let span = tracing::info_span!(
            "pipeline",
            run = %manifest.id.0,
            steps = pipeline.len()
        );
        let _enter = span.enter();

        let mut current = Collection::from_value(input.clone())?;
        let ctx = OpContext::new(&cfg, self.sink.as_ref(), now);

        for step in &pipeline.steps {
            state.advance(step.index);
            let op = step.kind.as_str();
            let records_in = current.len();

            current = match step.op.apply(&current, &ctx.at_step(step.index)) {
                Ok(next) => next,
                Err(OpError::Config(message)) => {
                    state.fail(step.index, op);
                    tracing::debug!(
                        step = step.index,
                        op,
                        state = %*state,
                        completed = manifest.steps.len(),
                        "pipeline aborted"
                    );
                    return Err(Error::Config {
                        step: step.index,
                        op: op.to_string(),
                        message,
                    });
                }
            };

            tracing::debug!(
                step = step.index,
                op,
                records_in,
                records_out = current.len(),
                "step finished"
            );
            manifest.record_step(StepStats {
                index: step.index,
                op: op.to_string(),
                records_in,
                records_out: current.len(),
            });
        }

        state.complete();
        let records = current.len();
        let output = current.into_value();
        let manifest = manifest.finish(now_millis(), hash_value(&output));
        tracing::debug!(state = %*state, records, "pipeline finished");
        Ok(RunOutput { output, manifest })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
