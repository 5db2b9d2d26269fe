//! Executor state machine.
//!
//! `Idle → Running(0) → … → Running(n-1) → Completed`, or `Running(i) →
//! Failed` on a fatal error. `Completed` and `Failed` are terminal.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(usize),
    Completed,
    Failed { step: usize, op: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }

    /// Enter step `step`. Only legal from `Idle` (step 0) or the previous step.
    pub fn advance(&mut self, step: usize) {
        debug_assert!(
            matches!((&*self, step), (RunState::Idle, 0))
                || matches!(&*self, RunState::Running(i) if *i + 1 == step),
            "illegal transition {self} -> running({step})"
        );
        *self = RunState::Running(step);
    }

    pub fn complete(&mut self) {
        debug_assert!(!self.is_terminal(), "run already finished: {self}");
        *self = RunState::Completed;
    }

    pub fn fail(&mut self, step: usize, op: impl Into<String>) {
        debug_assert!(!self.is_terminal(), "run already finished: {self}");
        *self = RunState::Failed {
            step,
            op: op.into(),
        };
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running(i) => write!(f, "running({i})"),
            RunState::Completed => f.write_str("completed"),
            RunState::Failed { step, op } => write!(f, "failed({step}, {op})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_steps_to_completion() {
        let mut s = RunState::Idle;
        s.advance(0);
        s.advance(1);
        assert_eq!(s, RunState::Running(1));
        s.complete();
        assert!(s.is_terminal());
        assert_eq!(s.to_string(), "completed");
    }

    #[test]
    fn failure_is_terminal() {
        let mut s = RunState::Idle;
        s.advance(0);
        s.fail(0, "select");
        assert!(s.is_terminal());
        assert_eq!(s.to_string(), "failed(0, select)");
    }

    #[test]
    fn empty_pipeline_completes_from_idle() {
        let mut s = RunState::Idle;
        s.complete();
        assert_eq!(s, RunState::Completed);
    }
}
