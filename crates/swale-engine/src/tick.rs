//! Step engine: the fixed-order, all-or-nothing stepping loop.
//!
//! [`StepEngine`] owns the committed [`NetworkState`] and a staging copy.
//! Each step seeds staging from the committed state, runs every stage
//! against staging and swaps the two only when all stages succeed, so a
//! failing stage leaves the committed state exactly as it was.
//!
//! Stage order:
//! 1. gage feed, 2. runoff (external), 3. RDII, 4. routing (external),
//! 5. pollutant transport, 6. statistics.

use std::time::Instant;

use swale_core::{
    ModelError, NodeId, Project, RoutingContext, RoutingModel, RunoffContext, RunoffModel, Stage,
    StepError,
};
use swale_quality::{PollutantTracker, TransportInputs};
use swale_rdii::{RdiiError, RdiiGenerator};

use crate::clock::SimClock;
use crate::config::{self, ConfigError};
use crate::gage::GageFeed;
use crate::metrics::StepMetrics;
use crate::state::NetworkState;
use crate::stats::StepSample;

const SECS_PER_DAY: f64 = 86_400.0;

// ── Sentinel checks ──────────────────────────────────────────────

fn first_non_finite(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    values.into_iter().position(|v| !v.is_finite())
}

fn check(quantity: &'static str, values: impl IntoIterator<Item = f64>) -> Result<(), ModelError> {
    match first_non_finite(values) {
        Some(index) => Err(ModelError::NonFinite { quantity, index }),
        None => Ok(()),
    }
}

fn check_runoff(state: &NetworkState) -> Result<(), ModelError> {
    let s = &state.surfaces;
    check("runoff", s.iter().map(|x| x.runoff))?;
    check("ponded depth", s.iter().map(|x| x.depth))?;
    check("buildup", s.iter().flat_map(|x| x.buildup.iter().copied()))?;
    check("washoff", s.iter().flat_map(|x| x.washoff.iter().copied()))
}

fn check_routing(state: &NetworkState) -> Result<(), ModelError> {
    let (n, l) = (&state.nodes, &state.links);
    check("node depth", n.iter().map(|x| x.depth))?;
    check("node volume", n.iter().map(|x| x.volume))?;
    check("node inflow", n.iter().map(|x| x.inflow))?;
    check("node outflow", n.iter().map(|x| x.outflow))?;
    check("link flow", l.iter().map(|x| x.flow))?;
    check("link depth", l.iter().map(|x| x.depth))?;
    check("link volume", l.iter().map(|x| x.volume))
}

fn check_quality(state: &NetworkState) -> Result<(), ModelError> {
    let q = &state.quality;
    check(
        "runoff concentration",
        q.subcatchments.iter().flat_map(|x| x.runoff.iter().copied()),
    )?;
    check("node concentration", q.nodes.iter().flat_map(|x| x.qual.iter().copied()))?;
    check("link concentration", q.links.iter().flat_map(|x| x.qual.iter().copied()))
}

fn stage_failed(stage: Stage, model: &str, reason: ModelError) -> StepError {
    log::warn!("{stage} stage ({model}) failed: {reason}");
    StepError::StageFailed {
        stage,
        model: model.to_string(),
        reason,
    }
}

// ── StepEngine ───────────────────────────────────────────────────

/// Single-threaded stepping engine of one run.
pub struct StepEngine {
    project: Project,
    clock: SimClock,
    rdii: RdiiGenerator,
    tracker: PollutantTracker,
    outlets: Vec<NodeId>,
    direct_flow: Vec<f64>,
    terminal: Vec<bool>,
    gage_totals: Vec<f64>,
    current: NetworkState,
    staging: NetworkState,
    finished: bool,
    last_metrics: StepMetrics,
}

impl StepEngine {
    /// Build the engine for a project.
    ///
    /// Validates the project, precomputes RDII kernels for every month
    /// (and for a short final step) and sets up the initial state.
    pub fn new(project: Project) -> Result<Self, ConfigError> {
        config::validate(&project)?;
        let clock = SimClock::new(&project.options)?;
        let last_step = clock.step_length(clock.total_steps().saturating_sub(1));
        let rdii = RdiiGenerator::new(&project)
            .and_then(|rdii| rdii.with_short_step(&project, last_step))
            .map_err(|e| match e {
                RdiiError::Kernel { unit_hyd, reason } => ConfigError::InvalidRtk { unit_hyd, reason },
            })?;
        let tracker = PollutantTracker::new(&project);
        let outlets = project.subcatchments.values().map(|sc| sc.outlet).collect();
        let direct_flow = project
            .nodes
            .values()
            .map(|n| n.direct.as_ref().map_or(0.0, |d| d.flow))
            .collect();
        let terminal = project.outgoing_links().iter().map(Vec::is_empty).collect();
        let current = NetworkState::initial(&project, &rdii);
        let staging = current.clone();
        log::debug!(
            "step engine: {} steps of {}s",
            clock.total_steps(),
            project.options.step_secs
        );
        Ok(Self {
            gage_totals: vec![0.0; project.gages.len()],
            project,
            clock,
            rdii,
            tracker,
            outlets,
            direct_flow,
            terminal,
            current,
            staging,
            finished: false,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Execute one step.
    ///
    /// Returns the elapsed simulated time in days, or exactly `0.0` when
    /// this step reached the end of the run. On error nothing is committed
    /// and the step may be retried.
    pub fn execute_step(
        &mut self,
        feed: &GageFeed,
        runoff: &dyn RunoffModel,
        routing: &dyn RoutingModel,
    ) -> Result<f64, StepError> {
        let step_start = Instant::now();
        let mut stage_us = Vec::with_capacity(6);

        // 0. Seed staging from the committed state.
        self.staging.clone_from(&self.current);
        let prev = &self.current;
        let next = &mut self.staging;
        let index = prev.step_index;
        let t0 = self.clock.elapsed_secs(index);
        let dt = self.clock.step_length(index);
        let month = self.clock.month_index(t0);

        // 1. Resolve gage precipitation at the start of the interval.
        let t = Instant::now();
        feed.resolve(t0, &mut next.gages);
        for (precip, sc) in next.precip.iter_mut().zip(self.project.subcatchments.values()) {
            *precip = next.gages[sc.gage.index()].total;
        }
        for (total, reading) in self.gage_totals.iter_mut().zip(&next.gages) {
            *total = reading.total;
        }
        stage_us.push((Stage::GageFeed, t.elapsed().as_micros() as u64));

        // 2. Runoff, buildup and washoff.
        let t = Instant::now();
        {
            let mut ctx =
                RunoffContext::new(&self.project, &next.precip, &prev.surfaces, &mut next.surfaces, dt);
            runoff
                .step(&mut ctx)
                .map_err(|e| stage_failed(Stage::Runoff, runoff.name(), e))?;
        }
        check_runoff(next).map_err(|e| stage_failed(Stage::Runoff, runoff.name(), e))?;
        stage_us.push((Stage::Runoff, t.elapsed().as_micros() as u64));

        // 3. RDII convolution, then lateral inflow per node.
        let t = Instant::now();
        self.rdii.step(&mut next.rdii, &self.gage_totals, month, dt);
        next.lateral.copy_from_slice(&self.direct_flow);
        for (lateral, rdii) in next.lateral.iter_mut().zip(next.rdii.inflow()) {
            *lateral += rdii;
        }
        for (outlet, surface) in self.outlets.iter().zip(&next.surfaces) {
            next.lateral[outlet.index()] += surface.runoff;
        }
        stage_us.push((Stage::Rdii, t.elapsed().as_micros() as u64));

        // 4. Routing.
        let t = Instant::now();
        {
            let mut ctx =
                RoutingContext::new(&self.project, &next.lateral, &mut next.nodes, &mut next.links, dt);
            routing
                .step(&mut ctx)
                .map_err(|e| stage_failed(Stage::Routing, routing.name(), e))?;
        }
        check_routing(next).map_err(|e| stage_failed(Stage::Routing, routing.name(), e))?;
        stage_us.push((Stage::Routing, t.elapsed().as_micros() as u64));

        // 5. Pollutant transport.
        let t = Instant::now();
        {
            let inputs = TransportInputs {
                dt,
                precip: &next.precip,
                prev_surfaces: &prev.surfaces,
                surfaces: &next.surfaces,
                rdii: next.rdii.inflow(),
                prev_nodes: &prev.nodes,
                nodes: &next.nodes,
                prev_links: &prev.links,
                links: &next.links,
            };
            self.tracker.step(&inputs, &mut next.quality);
        }
        check_quality(next).map_err(|e| stage_failed(Stage::Quality, "pollutant_tracker", e))?;
        stage_us.push((Stage::Quality, t.elapsed().as_micros() as u64));

        // 6. Statistics.
        let t = Instant::now();
        next.stats.accumulate(&StepSample {
            dt,
            precip: &next.precip,
            surfaces: &next.surfaces,
            rdii: next.rdii.inflow(),
            direct: &self.direct_flow,
            nodes: &next.nodes,
            links: &next.links,
            terminal: &self.terminal,
        });
        stage_us.push((Stage::Statistics, t.elapsed().as_micros() as u64));

        // 7. Commit.
        next.step_index = index + 1;
        std::mem::swap(&mut self.current, &mut self.staging);
        self.last_metrics = StepMetrics {
            step_index: index,
            total_us: step_start.elapsed().as_micros() as u64,
            stage_us,
        };

        if self.current.step_index >= self.clock.total_steps() {
            self.finished = true;
            return Ok(0.0);
        }
        Ok(self.clock.elapsed_secs(self.current.step_index) / SECS_PER_DAY)
    }

    /// The project being run.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The run clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Committed state.
    pub fn state(&self) -> &NetworkState {
        &self.current
    }

    /// Committed state, for between-step edits (overrides).
    pub fn state_mut(&mut self) -> &mut NetworkState {
        &mut self.current
    }

    /// Whether the terminal step has been executed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Elapsed simulated time in days.
    pub fn elapsed_days(&self) -> f64 {
        self.clock.elapsed_secs(self.current.step_index) / SECS_PER_DAY
    }

    /// Metrics of the latest committed step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }
}
