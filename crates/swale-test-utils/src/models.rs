//! Collaborators that misbehave on purpose.
//!
//! - [`FailingRunoff`] / [`FailingRouting`]: wrap the reference models and
//!   fail deterministically after N successful steps.
//! - [`NanRunoff`] / [`NanRouting`]: report success but write NaN.

use std::sync::atomic::{AtomicUsize, Ordering};

use swale_core::{ModelError, RoutingContext, RoutingModel, RunoffContext, RunoffModel};
use swale_models::{LinearReservoirRunoff, SteadyFlowRouting};

fn exhausted(calls: &AtomicUsize, succeed_count: usize) -> Result<(), ModelError> {
    let n = calls.fetch_add(1, Ordering::Relaxed);
    if n >= succeed_count {
        Err(ModelError::ExecutionFailed {
            reason: format!("deliberate failure after {succeed_count} steps"),
        })
    } else {
        Ok(())
    }
}

/// Linear-reservoir runoff that fails after `succeed_count` steps.
pub struct FailingRunoff {
    pub succeed_count: usize,
    inner: LinearReservoirRunoff,
    call_count: AtomicUsize,
}

impl FailingRunoff {
    /// Succeed `succeed_count` times, then fail every call.
    pub fn after(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            inner: LinearReservoirRunoff::new(),
            call_count: AtomicUsize::new(0),
        }
    }
}

impl RunoffModel for FailingRunoff {
    fn name(&self) -> &str {
        "failing_runoff"
    }

    fn step(&self, ctx: &mut RunoffContext<'_>) -> Result<(), ModelError> {
        exhausted(&self.call_count, self.succeed_count)?;
        self.inner.step(ctx)
    }
}

/// Steady-flow routing that fails after `succeed_count` steps.
pub struct FailingRouting {
    pub succeed_count: usize,
    inner: SteadyFlowRouting,
    call_count: AtomicUsize,
}

impl FailingRouting {
    /// Succeed `succeed_count` times, then fail every call.
    pub fn after(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            inner: SteadyFlowRouting::new(),
            call_count: AtomicUsize::new(0),
        }
    }
}

impl RoutingModel for FailingRouting {
    fn name(&self) -> &str {
        "failing_routing"
    }

    fn step(&self, ctx: &mut RoutingContext<'_>) -> Result<(), ModelError> {
        exhausted(&self.call_count, self.succeed_count)?;
        self.inner.step(ctx)
    }
}

/// Runoff that writes NaN into every subcatchment's runoff.
pub struct NanRunoff;

impl RunoffModel for NanRunoff {
    fn name(&self) -> &str {
        "nan_runoff"
    }

    fn step(&self, ctx: &mut RunoffContext<'_>) -> Result<(), ModelError> {
        for surface in ctx.surfaces_mut() {
            surface.runoff = f64::NAN;
        }
        Ok(())
    }
}

/// Routing that runs the reference model, then writes NaN into the flow
/// of the first link.
pub struct NanRouting;

impl RoutingModel for NanRouting {
    fn name(&self) -> &str {
        "nan_routing"
    }

    fn step(&self, ctx: &mut RoutingContext<'_>) -> Result<(), ModelError> {
        SteadyFlowRouting::new().step(ctx)?;
        let (_, links) = ctx.state_mut();
        if let Some(link) = links.first_mut() {
            link.flow = f64::NAN;
        }
        Ok(())
    }
}
