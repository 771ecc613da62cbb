//! Per-step performance metrics.
//!
//! [`StepMetrics`] captures the wall-clock cost of the most recent step,
//! broken down by stage, for profiling and telemetry.

use swale_core::Stage;

/// Timing of a single step.
///
/// All durations are in microseconds. The engine replaces these after
/// every committed step; failed steps leave the previous values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Index of the step measured (0-based).
    pub step_index: u64,
    /// Wall-clock time of the whole step.
    pub total_us: u64,
    /// Per-stage execution times, in execution order.
    pub stage_us: Vec<(Stage, u64)>,
}

impl StepMetrics {
    /// Time spent in `stage`, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<u64> {
        self.stage_us
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|&(_, us)| us)
    }
}
