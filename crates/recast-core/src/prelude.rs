//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::diag::{Diagnostic, DiagnosticSink, Level, MemorySink, NullSink, TracingSink};
pub use crate::error::{Error, Result};
pub use crate::hash::{GroupKey, Hash256};
pub use crate::manifest::{ManifestId, RunManifest, StepStats};
pub use crate::path::{assign, resolve};
pub use crate::types::{Collection, Record};
