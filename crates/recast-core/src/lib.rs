#![forbid(unsafe_code)]
//! recast-core: shared value model, field paths, configs, diagnostics,
//! manifests, and structural hashing for the recast transform pipeline.
//!
//! Design intent:
//! - Records are `serde_json` maps built with `preserve_order`, so field order
//!   survives every operator.
//! - Nothing in here performs I/O; the CLI and host integrations own that.
//! - Diagnostics go through an injected [`diag::DiagnosticSink`] rather than a
//!   global side channel.

pub mod config;
pub mod diag;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod path;
pub mod prelude;
pub mod types;
pub mod value;

/// Engine version string recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
