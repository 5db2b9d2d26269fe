//! Diagnostic sink passed into the executor and operators.
//!
//! Operators never log directly; they emit [`Diagnostic`]s into whatever sink
//! the caller injected. The default sink forwards to `tracing`; tests use
//! [`MemorySink`] to assert on what was reported.

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// Step index the diagnostic belongs to, if raised while a step ran.
    pub step: Option<usize>,
    /// Operator name (stable, as written in pipeline documents).
    pub op: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            step: None,
            op: None,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            ..Self::info(message)
        }
    }

    pub fn at(mut self, step: usize, op: impl Into<String>) -> Self {
        self.step = Some(step);
        self.op = Some(op.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.step, &self.op) {
            (Some(step), Some(op)) => write!(f, "[step {step} {op}] {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Append-only destination for diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` events under the `recast` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: Diagnostic) {
        let op = d.op.as_deref().unwrap_or("-");
        match d.level {
            Level::Info => {
                tracing::info!(target: "recast", step = ?d.step, op, "{}", d.message)
            }
            Level::Warn => {
                tracing::warn!(target: "recast", step = ?d.step, op, "{}", d.message)
            }
        }
    }
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in emission order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|d| d.message).collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(diagnostic);
        }
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}
