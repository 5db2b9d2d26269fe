#![forbid(unsafe_code)]
//! recast-exec: runs a compiled pipeline over one in-memory collection and
//! emits a run manifest.
//!
//! Execution is single-threaded and strictly sequential. The evolving
//! collection is the only state carried between steps; a fatal error stops
//! the run and no partial output is returned.

pub mod runtime;
pub mod state;

pub use runtime::{Engine, RunOutput};
pub use state::RunState;
