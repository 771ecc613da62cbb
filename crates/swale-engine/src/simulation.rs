//! The run API: one [`Simulation`] per independent run.
//!
//! Every call is checked in the same order: lifecycle phase first, then
//! indices and selectors, then values. A failing call changes nothing.

use std::path::{Path, PathBuf};

use swale_core::{
    GageId, IndexError, LifecycleError, LinkResult, NodeId, NodeParam, NodeResult, ObjectKind,
    OverrideMode, ParameterError, PollutantProperty, PrecipKind, Project, ProjectLoader,
    RdiiInflow, RoutingModel, RtkTable, RunoffModel, SubcatchPollutant, SubcatchResult, UnitHydId,
};
use swale_models::{LinearReservoirRunoff, SteadyFlowRouting};
use swale_quality::ConveyanceQuality;

use crate::config;
use crate::error::ApiError;
use crate::gage::{GageFeed, GageReading};
use crate::lifecycle::{Lifecycle, RunPhase, BEFORE_END, ENDED, LOADED, PRE_RUN, RUNNING};
use crate::metrics::StepMetrics;
use crate::stats::{LinkStats, NodeStats, RoutingTotals, RunStatistics, SubcatchStats};
use crate::tick::StepEngine;

/// Continuity error above which `end` warns.
const CONTINUITY_WARN: f64 = 0.01;

/// Paths handed to `open`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPaths {
    /// Project input.
    pub input: PathBuf,
    /// Report file.
    pub report: PathBuf,
    /// Binary results file.
    pub output: PathBuf,
}

struct Run {
    paths: RunPaths,
    project: Project,
    feed: GageFeed,
    engine: Option<StepEngine>,
    save_results: bool,
    final_stats: Option<RunStatistics>,
}

// Compile-time assertion: Simulation is Send.
// Fails to compile if any field is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
    }
};

/// One simulation run and its lifecycle.
pub struct Simulation {
    lifecycle: Lifecycle,
    loader: Box<dyn ProjectLoader>,
    runoff: Box<dyn RunoffModel>,
    routing: Box<dyn RoutingModel>,
    run: Option<Run>,
}

fn check_index(project: &Project, kind: ObjectKind, index: u32) -> Result<usize, IndexError> {
    if (index as usize) < project.count(kind) {
        Ok(index as usize)
    } else {
        Err(IndexError::Object { kind, index })
    }
}

fn owned(values: &[f64]) -> Result<Vec<f64>, ApiError> {
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())
        .map_err(|_| ApiError::Allocation)?;
    out.extend_from_slice(values);
    Ok(out)
}

fn concentration(value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::InvalidValue {
            name: "concentration",
            value,
        })
    }
}

fn conveyance_values(q: &ConveyanceQuality, property: PollutantProperty) -> &[f64] {
    match property {
        PollutantProperty::Qual => &q.qual,
        PollutantProperty::Cin => &q.cin,
        PollutantProperty::TotalLoad => &q.total_load,
    }
}

impl Simulation {
    /// A closed simulation using the given collaborators.
    pub fn new(
        loader: Box<dyn ProjectLoader>,
        runoff: Box<dyn RunoffModel>,
        routing: Box<dyn RoutingModel>,
    ) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            loader,
            runoff,
            routing,
            run: None,
        }
    }

    /// A closed simulation using the reference runoff and routing models.
    pub fn with_reference_models(loader: impl ProjectLoader + 'static) -> Self {
        Self::new(
            Box::new(loader),
            Box::new(LinearReservoirRunoff::new()),
            Box::new(SteadyFlowRouting::new()),
        )
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.lifecycle.phase()
    }

    /// The lifecycle gate, for callers that decode arguments before
    /// calling in and must report phase errors first.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn run(&self, allowed: &[RunPhase]) -> Result<&Run, ApiError> {
        self.lifecycle.require(allowed)?;
        Ok(self.run.as_ref().ok_or(LifecycleError::NotOpen)?)
    }

    fn run_mut(&mut self, allowed: &[RunPhase]) -> Result<&mut Run, ApiError> {
        self.lifecycle.require(allowed)?;
        Ok(self.run.as_mut().ok_or(LifecycleError::NotOpen)?)
    }

    fn engine(&self, allowed: &[RunPhase]) -> Result<&StepEngine, ApiError> {
        let run = self.run(allowed)?;
        Ok(run.engine.as_ref().ok_or(LifecycleError::NotRunning)?)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load and validate the project named by `input`.
    pub fn open(
        &mut self,
        input: impl AsRef<Path>,
        report: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.lifecycle.check_transition(RunPhase::Opened)?;
        let input = input.as_ref();
        let project = self.loader.load(input)?;
        config::validate(&project)?;
        log::info!(
            "opened '{}': {} gages, {} subcatchments, {} nodes, {} links, {} pollutants, {} unit hydrographs",
            input.display(),
            project.gages.len(),
            project.subcatchments.len(),
            project.nodes.len(),
            project.links.len(),
            project.pollutants.len(),
            project.unit_hydrographs.len(),
        );
        self.run = Some(Run {
            paths: RunPaths {
                input: input.to_path_buf(),
                report: report.as_ref().to_path_buf(),
                output: output.as_ref().to_path_buf(),
            },
            feed: GageFeed::new(&project),
            project,
            engine: None,
            save_results: false,
            final_stats: None,
        });
        self.lifecycle.enter(RunPhase::Opened);
        Ok(())
    }

    /// Start the run. Pre-run edits are validated again here.
    pub fn start(&mut self, save_results: bool) -> Result<(), ApiError> {
        self.lifecycle.check_transition(RunPhase::Running)?;
        let run = self.run.as_mut().ok_or(LifecycleError::NotOpen)?;
        let mut engine = StepEngine::new(run.project.clone())?;
        run.feed.resolve(0.0, &mut engine.state_mut().gages);
        run.engine = Some(engine);
        run.save_results = save_results;
        self.lifecycle.enter(RunPhase::Running);
        Ok(())
    }

    /// Advance one step.
    ///
    /// Returns elapsed simulated days, or exactly `0.0` once the run has
    /// reached its end. Stepping again after that fails `NotRunning`.
    pub fn step(&mut self) -> Result<f64, ApiError> {
        self.lifecycle.require(RUNNING)?;
        let run = self.run.as_mut().ok_or(LifecycleError::NotOpen)?;
        let engine = run.engine.as_mut().ok_or(LifecycleError::NotRunning)?;
        if engine.is_finished() {
            return Err(LifecycleError::NotRunning.into());
        }
        Ok(engine.execute_step(&run.feed, self.runoff.as_ref(), self.routing.as_ref())?)
    }

    /// End the run and freeze its statistics.
    pub fn end(&mut self) -> Result<(), ApiError> {
        self.lifecycle.check_transition(RunPhase::Ended)?;
        let run = self.run.as_mut().ok_or(LifecycleError::NotOpen)?;
        let engine = run.engine.as_ref().ok_or(LifecycleError::NotRunning)?;
        let stats = engine.state().stats.clone();
        let continuity = stats.routing.continuity_error();
        log::info!(
            "run ended after {} steps; flow continuity error {:.4}%",
            engine.state().step_index,
            continuity * 100.0
        );
        if continuity.abs() > CONTINUITY_WARN {
            log::warn!("flow continuity error {:.2}% exceeds 1%", continuity * 100.0);
        }
        run.final_stats = Some(stats);
        self.lifecycle.enter(RunPhase::Ended);
        Ok(())
    }

    /// Release the run. A running simulation is ended implicitly.
    pub fn close(&mut self) -> Result<(), ApiError> {
        self.lifecycle.check_transition(RunPhase::Closed)?;
        if self.lifecycle.phase() == RunPhase::Running {
            self.end()?;
        }
        self.run = None;
        self.lifecycle.enter(RunPhase::Closed);
        Ok(())
    }

    /// Paths of the open run.
    pub fn paths(&self) -> Result<&RunPaths, ApiError> {
        Ok(&self.run(LOADED)?.paths)
    }

    /// Whether `start` asked for results to be saved.
    pub fn saves_results(&self) -> Result<bool, ApiError> {
        Ok(self.run(LOADED)?.save_results)
    }

    /// Elapsed simulated time in days.
    pub fn elapsed_days(&self) -> Result<f64, ApiError> {
        let run = self.run(LOADED)?;
        Ok(run.engine.as_ref().map_or(0.0, StepEngine::elapsed_days))
    }

    /// Timing of the latest committed step.
    pub fn last_metrics(&self) -> Result<&StepMetrics, ApiError> {
        let run = self.run(LOADED)?;
        let engine = run.engine.as_ref().ok_or(LifecycleError::NotRunning)?;
        Ok(engine.last_metrics())
    }

    // ── Lookup ───────────────────────────────────────────────────

    /// Index of the entity `id` of `kind`.
    pub fn object_index(&self, kind: ObjectKind, id: &str) -> Result<u32, ApiError> {
        let run = self.run(LOADED)?;
        run.project.index_of(kind, id).ok_or_else(|| {
            IndexError::UnknownId {
                kind,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Number of entities of `kind`.
    pub fn object_count(&self, kind: ObjectKind) -> Result<usize, ApiError> {
        Ok(self.run(LOADED)?.project.count(kind))
    }

    // ── Gages ────────────────────────────────────────────────────

    /// Current precipitation rate of a gage.
    pub fn precipitation(&self, gage: u32, kind: PrecipKind) -> Result<f64, ApiError> {
        let run = self.run(BEFORE_END)?;
        let g = check_index(&run.project, ObjectKind::Gage, gage)?;
        let reading = match &run.engine {
            Some(engine) => engine.state().gages[g],
            None => run.feed.reading_at(GageId(gage), 0.0),
        };
        Ok(reading.get(kind))
    }

    /// Override a gage's precipitation for this and all later steps.
    ///
    /// The getter reports the new rate at once; subcatchments receive it
    /// when the next step resolves precipitation.
    pub fn set_precipitation(&mut self, gage: u32, rate: f64) -> Result<(), ApiError> {
        let run = self.run_mut(BEFORE_END)?;
        let g = check_index(&run.project, ObjectKind::Gage, gage)?;
        run.feed.set_override(GageId(gage), rate)?;
        if let Some(engine) = run.engine.as_mut() {
            engine.state_mut().gages[g] = GageReading::forced(rate);
        }
        Ok(())
    }

    // ── RDII ─────────────────────────────────────────────────────

    /// RTK table of a unit hydrograph.
    pub fn rdii_params(&self, unit_hyd: u32) -> Result<RtkTable, ApiError> {
        let run = self.run(PRE_RUN)?;
        let u = check_index(&run.project, ObjectKind::UnitHydrograph, unit_hyd)?;
        Ok(run.project.unit_hydrographs[u].rtk.clone())
    }

    /// Replace the RTK table of a unit hydrograph. Rejected tables leave
    /// the old one in place.
    pub fn set_rdii_params(&mut self, unit_hyd: u32, table: &RtkTable) -> Result<(), ApiError> {
        let run = self.run_mut(PRE_RUN)?;
        let u = check_index(&run.project, ObjectKind::UnitHydrograph, unit_hyd)?;
        table.validate()?;
        table.check_window(run.project.options.step_secs)?;
        run.project.unit_hydrographs[u].rtk = table.clone();
        Ok(())
    }

    /// [`set_rdii_params`](Self::set_rdii_params) from the flattened
    /// month-major layout.
    pub fn set_rdii_params_flat(&mut self, unit_hyd: u32, values: &[f64]) -> Result<(), ApiError> {
        let run = self.run(PRE_RUN)?;
        check_index(&run.project, ObjectKind::UnitHydrograph, unit_hyd)?;
        let table = RtkTable::from_flat(values)?;
        self.set_rdii_params(unit_hyd, &table)
    }

    /// An RDII parameter of a node.
    ///
    /// `UnitHydrograph` reads `-1` and `RdiiArea` reads `0` for a node
    /// without RDII.
    pub fn node_param(&self, node: u32, param: NodeParam) -> Result<f64, ApiError> {
        let run = self.run(PRE_RUN)?;
        let n = check_index(&run.project, ObjectKind::Node, node)?;
        let rdii = run.project.nodes[n].rdii;
        Ok(match param {
            NodeParam::RdiiArea => rdii.map_or(0.0, |r| r.area),
            NodeParam::UnitHydrograph => rdii.map_or(-1.0, |r| f64::from(r.unit_hyd.0)),
        })
    }

    /// Set an RDII parameter of a node.
    ///
    /// `UnitHydrograph` takes a unit-hydrograph index, or `-1` to remove
    /// the assignment. A new assignment starts with zero area.
    pub fn set_node_param(&mut self, node: u32, param: NodeParam, value: f64) -> Result<(), ApiError> {
        let run = self.run_mut(PRE_RUN)?;
        let n = check_index(&run.project, ObjectKind::Node, node)?;
        let unit_hyds = run.project.unit_hydrographs.len();
        let def = &mut run.project.nodes[n];
        match param {
            NodeParam::UnitHydrograph => {
                if value == -1.0 {
                    def.rdii = None;
                    return Ok(());
                }
                let integral = value.is_finite() && value.fract() == 0.0 && value >= 0.0;
                if !integral || value >= unit_hyds as f64 {
                    return Err(IndexError::Object {
                        kind: ObjectKind::UnitHydrograph,
                        index: value as u32,
                    }
                    .into());
                }
                let unit_hyd = UnitHydId(value as u32);
                let area = def.rdii.map_or(0.0, |r| r.area);
                def.rdii = Some(RdiiInflow { unit_hyd, area });
            }
            NodeParam::RdiiArea => {
                if !value.is_finite() || value < 0.0 {
                    return Err(ParameterError::InvalidValue {
                        name: "rdii area",
                        value,
                    }
                    .into());
                }
                let rdii = def.rdii.as_mut().ok_or(ParameterError::NoUnitHydrograph {
                    node: NodeId(node),
                })?;
                rdii.area = value;
            }
        }
        Ok(())
    }

    // ── Live results ─────────────────────────────────────────────

    /// A hydrology result of a subcatchment.
    pub fn subcatch_result(&self, subcatch: u32, result: SubcatchResult) -> Result<f64, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Subcatchment, subcatch)?;
        let s = &engine.state().surfaces[i];
        Ok(match result {
            SubcatchResult::Rainfall => s.rainfall,
            SubcatchResult::Depth => s.depth,
            SubcatchResult::Runoff => s.runoff,
        })
    }

    /// A hydraulic result of a node.
    pub fn node_result(&self, node: u32, result: NodeResult) -> Result<f64, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Node, node)?;
        let state = engine.state();
        let n = &state.nodes[i];
        Ok(match result {
            NodeResult::Depth => n.depth,
            NodeResult::Volume => n.volume,
            NodeResult::Inflow => n.inflow,
            NodeResult::Outflow => n.outflow,
            NodeResult::LateralInflow => n.lateral_inflow,
            NodeResult::RdiiInflow => state.rdii.inflow()[i],
        })
    }

    /// A hydraulic result of a link.
    pub fn link_result(&self, link: u32, result: LinkResult) -> Result<f64, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Link, link)?;
        let l = &engine.state().links[i];
        Ok(match result {
            LinkResult::Flow => l.flow,
            LinkResult::Depth => l.depth,
            LinkResult::Volume => l.volume,
        })
    }

    // ── Pollutants ───────────────────────────────────────────────

    /// Per-pollutant values of a subcatchment.
    pub fn subcatch_pollut(&self, subcatch: u32, property: SubcatchPollutant) -> Result<Vec<f64>, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Subcatchment, subcatch)?;
        let state = engine.state();
        let q = &state.quality.subcatchments[i];
        owned(match property {
            SubcatchPollutant::Buildup => &state.surfaces[i].buildup,
            SubcatchPollutant::Ponded => &q.ponded,
            SubcatchPollutant::RunoffQual => &q.runoff,
            SubcatchPollutant::TotalLoad => &q.total_load,
        })
    }

    /// Per-pollutant values of a node.
    pub fn node_pollut(&self, node: u32, property: PollutantProperty) -> Result<Vec<f64>, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Node, node)?;
        owned(conveyance_values(&engine.state().quality.nodes[i], property))
    }

    /// Per-pollutant values of a link.
    pub fn link_pollut(&self, link: u32, property: PollutantProperty) -> Result<Vec<f64>, ApiError> {
        let engine = self.engine(RUNNING)?;
        let i = check_index(engine.project(), ObjectKind::Link, link)?;
        owned(conveyance_values(&engine.state().quality.links[i], property))
    }

    fn conveyance_mut(
        &mut self,
        kind: ObjectKind,
        index: u32,
        pollutant: u32,
    ) -> Result<(&mut ConveyanceQuality, usize), ApiError> {
        self.lifecycle.require(RUNNING)?;
        let run = self.run.as_mut().ok_or(LifecycleError::NotOpen)?;
        let engine = run.engine.as_mut().ok_or(LifecycleError::NotRunning)?;
        let i = check_index(engine.project(), kind, index)?;
        let p = check_index(engine.project(), ObjectKind::Pollutant, pollutant)?;
        let quality = &mut engine.state_mut().quality;
        let q = match kind {
            ObjectKind::Link => &mut quality.links[i],
            _ => &mut quality.nodes[i],
        };
        Ok((q, p))
    }

    /// Force a node concentration for the next step only.
    pub fn set_node_pollut(&mut self, node: u32, pollutant: u32, value: f64) -> Result<(), ApiError> {
        self.set_node_pollut_with_mode(node, OverrideMode::OneStep, pollutant, value)
    }

    /// Force a node concentration for the given duration.
    pub fn set_node_pollut_with_mode(
        &mut self,
        node: u32,
        mode: OverrideMode,
        pollutant: u32,
        value: f64,
    ) -> Result<(), ApiError> {
        let (q, p) = self.conveyance_mut(ObjectKind::Node, node, pollutant)?;
        q.force(p, concentration(value)?, mode);
        Ok(())
    }

    /// Force a link concentration for the given duration.
    pub fn set_link_pollut(
        &mut self,
        link: u32,
        mode: OverrideMode,
        pollutant: u32,
        value: f64,
    ) -> Result<(), ApiError> {
        let (q, p) = self.conveyance_mut(ObjectKind::Link, link, pollutant)?;
        q.force(p, concentration(value)?, mode);
        Ok(())
    }

    /// Remove a node override.
    pub fn clear_node_pollut(&mut self, node: u32, pollutant: u32) -> Result<(), ApiError> {
        let (q, p) = self.conveyance_mut(ObjectKind::Node, node, pollutant)?;
        q.release(p);
        Ok(())
    }

    /// Remove a link override.
    pub fn clear_link_pollut(&mut self, link: u32, pollutant: u32) -> Result<(), ApiError> {
        let (q, p) = self.conveyance_mut(ObjectKind::Link, link, pollutant)?;
        q.release(p);
        Ok(())
    }

    // ── Statistics ───────────────────────────────────────────────

    fn final_stats(&self) -> Result<&RunStatistics, ApiError> {
        let run = self.run(ENDED)?;
        Ok(run.final_stats.as_ref().ok_or(LifecycleError::NotEnded)?)
    }

    /// Totals of a subcatchment.
    pub fn subcatch_stats(&self, subcatch: u32) -> Result<SubcatchStats, ApiError> {
        let stats = self.final_stats()?;
        let i = check_index(&self.run(ENDED)?.project, ObjectKind::Subcatchment, subcatch)?;
        Ok(stats.subcatchments[i])
    }

    /// Totals of a node.
    pub fn node_stats(&self, node: u32) -> Result<NodeStats, ApiError> {
        let stats = self.final_stats()?;
        let i = check_index(&self.run(ENDED)?.project, ObjectKind::Node, node)?;
        Ok(stats.nodes[i])
    }

    /// Totals of a link.
    pub fn link_stats(&self, link: u32) -> Result<LinkStats, ApiError> {
        let stats = self.final_stats()?;
        let i = check_index(&self.run(ENDED)?.project, ObjectKind::Link, link)?;
        Ok(stats.links[i])
    }

    /// Network volume balance.
    pub fn routing_totals(&self) -> Result<RoutingTotals, ApiError> {
        Ok(self.final_stats()?.routing)
    }
}
