//! Run manifest for audit: what ran, over what, producing what.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

/// Record counts observed around one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub index: usize,
    pub op: String,
    pub records_in: usize,
    pub records_out: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the pipeline's step list (operator names + configs).
    pub pipeline_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Structural digest of the input collection.
    pub input_digest: Hash256,

    /// Structural digest of the output collection; set when the run finishes.
    pub output_digest: Option<Hash256>,

    pub steps: Vec<StepStats>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(pipeline_hash: Hash256, input_digest: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            pipeline_hash,
            engine_version: crate::VERSION.to_string(),
            input_digest,
            output_digest: None,
            steps: Vec::new(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn record_step(&mut self, stats: StepStats) {
        self.steps.push(stats);
    }

    pub fn finish(mut self, finished_ms: u64, output_digest: Hash256) -> Self {
        self.finished_ms = finished_ms;
        self.output_digest = Some(output_digest);
        self
    }
}
