//! Run lifecycle state machine.
//!
//! ```text
//! Closed ──open──▶ Opened ──start──▶ Running ──end──▶ Ended
//!    ▲               │                  │               │
//!    └─────close─────┴──────close───────┴─────close─────┘
//! ```
//!
//! Transitions are checked first and committed only once the work behind
//! them has succeeded, so a failed `open` stays Closed and a failed `start`
//! stays Opened.

use std::fmt;

use swale_core::LifecycleError;

/// Phase of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    /// No project loaded.
    #[default]
    Closed,
    /// Project loaded; pre-run edits allowed.
    Opened,
    /// Stepping.
    Running,
    /// Run finished; statistics available.
    Ended,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opened => "opened",
            Self::Running => "running",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Valid states of calls that read the entity tables.
pub const LOADED: &[RunPhase] = &[RunPhase::Opened, RunPhase::Running, RunPhase::Ended];
/// Valid states of gage calls.
pub const BEFORE_END: &[RunPhase] = &[RunPhase::Opened, RunPhase::Running];
/// Valid states of pre-run edits.
pub const PRE_RUN: &[RunPhase] = &[RunPhase::Opened];
/// Valid states of live result access.
pub const RUNNING: &[RunPhase] = &[RunPhase::Running];
/// Valid states of final statistics.
pub const ENDED: &[RunPhase] = &[RunPhase::Ended];

/// Tracks the phase and gates calls on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lifecycle {
    phase: RunPhase,
}

impl Lifecycle {
    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Fail unless the current phase is one of `allowed`.
    pub fn require(&self, allowed: &[RunPhase]) -> Result<(), LifecycleError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        Err(match self.phase {
            RunPhase::Closed => LifecycleError::NotOpen,
            RunPhase::Running => LifecycleError::Running,
            _ if allowed.contains(&RunPhase::Running) => LifecycleError::NotRunning,
            RunPhase::Opened if allowed.contains(&RunPhase::Ended) => LifecycleError::NotEnded,
            RunPhase::Ended => LifecycleError::Ended,
            RunPhase::Opened => LifecycleError::NotRunning,
        })
    }

    /// Check that `to` can be entered from the current phase.
    pub fn check_transition(&self, to: RunPhase) -> Result<(), LifecycleError> {
        use RunPhase::*;
        match (self.phase, to) {
            (Closed, Opened) | (Opened, Running) | (Running, Ended) => Ok(()),
            (Opened | Running | Ended, Closed) => Ok(()),
            (Closed, _) => Err(LifecycleError::NotOpen),
            (_, Opened) => Err(LifecycleError::AlreadyOpen),
            (Running, Running) => Err(LifecycleError::Running),
            (Ended, Running) => Err(LifecycleError::Ended),
            (_, Ended) => Err(LifecycleError::NotRunning),
        }
    }

    /// Enter `to`; callers check the transition first.
    pub fn enter(&mut self, to: RunPhase) {
        log::info!("run {} -> {}", self.phase, to);
        self.phase = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(phase: RunPhase) -> Lifecycle {
        Lifecycle { phase }
    }

    #[test]
    fn closed_rejects_everything_as_not_open() {
        let lc = at(RunPhase::Closed);
        for allowed in [LOADED, BEFORE_END, PRE_RUN, RUNNING, ENDED] {
            assert_eq!(lc.require(allowed), Err(LifecycleError::NotOpen));
        }
    }

    #[test]
    fn running_rejects_pre_run_and_stats_as_running() {
        let lc = at(RunPhase::Running);
        assert_eq!(lc.require(PRE_RUN), Err(LifecycleError::Running));
        assert_eq!(lc.require(ENDED), Err(LifecycleError::Running));
        assert_eq!(lc.require(RUNNING), Ok(()));
    }

    #[test]
    fn opened_and_ended_report_not_running() {
        assert_eq!(at(RunPhase::Opened).require(RUNNING), Err(LifecycleError::NotRunning));
        assert_eq!(at(RunPhase::Ended).require(RUNNING), Err(LifecycleError::NotRunning));
        assert_eq!(at(RunPhase::Ended).require(BEFORE_END), Err(LifecycleError::NotRunning));
    }

    #[test]
    fn stats_before_end_report_not_ended() {
        assert_eq!(at(RunPhase::Opened).require(ENDED), Err(LifecycleError::NotEnded));
    }

    #[test]
    fn pre_run_edit_after_end_reports_ended() {
        assert_eq!(at(RunPhase::Ended).require(PRE_RUN), Err(LifecycleError::Ended));
    }

    #[test]
    fn transitions() {
        assert_eq!(at(RunPhase::Closed).check_transition(RunPhase::Opened), Ok(()));
        assert_eq!(
            at(RunPhase::Opened).check_transition(RunPhase::Opened),
            Err(LifecycleError::AlreadyOpen)
        );
        assert_eq!(
            at(RunPhase::Running).check_transition(RunPhase::Running),
            Err(LifecycleError::Running)
        );
        assert_eq!(
            at(RunPhase::Ended).check_transition(RunPhase::Ended),
            Err(LifecycleError::NotRunning)
        );
        assert_eq!(
            at(RunPhase::Opened).check_transition(RunPhase::Ended),
            Err(LifecycleError::NotRunning)
        );
        assert_eq!(
            at(RunPhase::Closed).check_transition(RunPhase::Closed),
            Err(LifecycleError::NotOpen)
        );
        assert_eq!(at(RunPhase::Running).check_transition(RunPhase::Closed), Ok(()));
    }
}
