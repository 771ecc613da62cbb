//! Per-step RDII inflow generation.
//!
//! [`RdiiGenerator`] holds everything fixed for a run: kernels of each unit
//! hydrograph, the gage feeding it and the node assignments. The evolving
//! part, rainfall histories and the latest inflows, lives in [`RdiiState`]
//! so the engine can stage and commit it with the rest of the network.

use swale_core::{GageId, NodeId, Project, UnitHydId, RESPONSE_TERMS};

use crate::error::RdiiError;
use crate::history::RainHistory;
use crate::kernel::KernelSet;

/// Evolving RDII state of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RdiiState {
    histories: Vec<RainHistory>,
    unit_response: Vec<f64>,
    inflow: Vec<f64>,
}

impl RdiiState {
    /// Latest inflow per node.
    pub fn inflow(&self) -> &[f64] {
        &self.inflow
    }

    /// Latest response per unit area and unit rainfall rate, per unit
    /// hydrograph.
    pub fn unit_response(&self) -> &[f64] {
        &self.unit_response
    }

    /// Rainfall history of one unit hydrograph.
    pub fn history(&self, uh: UnitHydId) -> Option<&RainHistory> {
        self.histories.get(uh.index())
    }
}

struct Assignment {
    node: NodeId,
    unit_hyd: UnitHydId,
    area: f64,
}

/// Fixed RDII configuration of a run.
pub struct RdiiGenerator {
    kernels: Vec<KernelSet>,
    short_step: Option<(f64, Vec<KernelSet>)>,
    step_secs: f64,
    gages: Vec<GageId>,
    assignments: Vec<Assignment>,
    node_count: usize,
    flow_factor: f64,
}

impl RdiiGenerator {
    /// Build kernels for every unit hydrograph of `project` at its step.
    ///
    /// The project must already be validated: every reference in range
    /// and every RTK table admissible. Fails when a response term spans
    /// too many steps to hold as a kernel.
    pub fn new(project: &Project) -> Result<Self, RdiiError> {
        let step_secs = project.options.step_secs;
        let kernels = project
            .unit_hydrographs
            .values()
            .enumerate()
            .map(|(i, uh)| {
                KernelSet::new(&uh.rtk, step_secs).map_err(|reason| RdiiError::Kernel {
                    unit_hyd: UnitHydId(i as u32),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let gages = project.unit_hydrographs.values().map(|uh| uh.gage).collect();
        let assignments = project
            .nodes
            .values()
            .enumerate()
            .filter_map(|(i, node)| {
                node.rdii.map(|rdii| Assignment {
                    node: NodeId(i as u32),
                    unit_hyd: rdii.unit_hyd,
                    area: rdii.area,
                })
            })
            .collect();
        for (name, set) in project.unit_hydrographs.keys().zip(&kernels) {
            log::debug!("unit hydrograph '{name}': {} step window", set.window());
        }
        Ok(Self {
            kernels,
            short_step: None,
            step_secs,
            gages,
            assignments,
            node_count: project.nodes.len(),
            flow_factor: project.options.units.flow_per_rate_area(),
        })
    }

    /// Also build kernels for a final step of `dt_secs`.
    ///
    /// Steps of that length then use them; a `dt_secs` not shorter than
    /// the run's step is ignored.
    pub fn with_short_step(mut self, project: &Project, dt_secs: f64) -> Result<Self, RdiiError> {
        if dt_secs >= self.step_secs {
            return Ok(self);
        }
        let kernels = project
            .unit_hydrographs
            .values()
            .enumerate()
            .map(|(i, uh)| {
                KernelSet::short_step(&uh.rtk, self.step_secs, dt_secs).map_err(|reason| {
                    RdiiError::Kernel {
                        unit_hyd: UnitHydId(i as u32),
                        reason,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("rdii: short final step of {dt_secs}s");
        self.short_step = Some((dt_secs, kernels));
        Ok(self)
    }

    fn kernels_for(&self, dt_secs: f64) -> &[KernelSet] {
        match &self.short_step {
            Some((short, kernels)) if (dt_secs - short).abs() <= 1e-9 * self.step_secs => kernels,
            _ => &self.kernels,
        }
    }

    /// Dry initial state with histories sized to each kernel window.
    pub fn initial_state(&self) -> RdiiState {
        RdiiState {
            histories: self
                .kernels
                .iter()
                .map(|k| RainHistory::new(k.window()))
                .collect(),
            unit_response: vec![0.0; self.kernels.len()],
            inflow: vec![0.0; self.node_count],
        }
    }

    /// Append this step's gage totals and recompute node inflows.
    ///
    /// `gage_totals` is the total precipitation rate per gage; `month` is
    /// the 0-based calendar month of the step and `dt_secs` its length.
    pub fn step(&self, state: &mut RdiiState, gage_totals: &[f64], month: usize, dt_secs: f64) {
        for (i, kernels) in self.kernels_for(dt_secs).iter().enumerate() {
            let rain = gage_totals.get(self.gages[i].index()).copied().unwrap_or(0.0);
            let history = &mut state.histories[i];
            history.push(rain);
            state.unit_response[i] = (0..RESPONSE_TERMS)
                .map(|term| kernels.ratio(month, term) * history.convolve(kernels.weights(month, term)))
                .sum();
        }
        state.inflow.fill(0.0);
        for a in &self.assignments {
            state.inflow[a.node.index()] +=
                a.area * self.flow_factor * state.unit_response[a.unit_hyd.index()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swale_core::{
        GageDef, NodeDef, ParameterError, RdiiInflow, Rtk, RtkTable, SimOptions, UnitHydDef, UnitSystem,
    };

    fn project(rtk: RtkTable, area: f64) -> Project {
        let mut p = Project::new(SimOptions {
            step_secs: 3_600.0,
            units: UnitSystem::Si,
            ..SimOptions::default()
        });
        let g = p.add_gage("RG", GageDef::constant(0.0));
        let uh = p.add_unit_hydrograph("UH", UnitHydDef { gage: g, rtk });
        p.add_node(
            "N",
            NodeDef {
                rdii: Some(RdiiInflow { unit_hyd: uh, area }),
                ..NodeDef::default()
            },
        );
        p.add_node("dry", NodeDef::default());
        p
    }

    #[test]
    fn steady_rain_converges_to_ratio_times_rain() {
        let table = RtkTable::uniform([
            Rtk::new(0.2, 1.0, 2.0),
            Rtk::new(0.3, 3.0, 1.0),
            Rtk::new(0.0, 0.0, 0.0),
        ]);
        let gen = RdiiGenerator::new(&project(table, 10.0)).unwrap();
        let mut state = gen.initial_state();
        for _ in 0..20 {
            gen.step(&mut state, &[6.0], 0, 3_600.0);
        }
        let expected = 10.0 * UnitSystem::Si.flow_per_rate_area() * 0.5 * 6.0;
        assert!((state.inflow()[0] - expected).abs() < 1e-12);
        assert_eq!(state.inflow()[1], 0.0);
    }

    #[test]
    fn single_pulse_reproduces_kernel() {
        let table = RtkTable::uniform([
            Rtk::new(1.0, 2.0, 1.0),
            Rtk::default(),
            Rtk::default(),
        ]);
        let gen = RdiiGenerator::new(&project(table, 1.0)).unwrap();
        let mut state = gen.initial_state();
        let mut response = Vec::new();
        for rain in [1.0, 0.0, 0.0, 0.0, 0.0] {
            gen.step(&mut state, &[rain], 0, 3_600.0);
            response.push(state.unit_response()[0]);
        }
        // Triangle base 4 h at hourly steps.
        let expected = [1.0 / 8.0, 3.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0, 0.0];
        for (got, want) in response.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{response:?}");
        }
    }

    #[test]
    fn month_selects_group() {
        let mut table = RtkTable::default();
        table.set(6, 0, Rtk::new(0.5, 0.0, 0.0));
        let gen = RdiiGenerator::new(&project(table, 1.0)).unwrap();
        let mut state = gen.initial_state();
        gen.step(&mut state, &[2.0], 0, 3_600.0);
        assert_eq!(state.unit_response()[0], 0.0);
        gen.step(&mut state, &[2.0], 6, 3_600.0);
        assert!((state.unit_response()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn oversized_term_names_its_hydrograph() {
        let mut table = RtkTable::default();
        table.set(0, 0, Rtk::new(0.1, 1e300, 1.0));
        match RdiiGenerator::new(&project(table, 1.0)) {
            Err(RdiiError::Kernel {
                unit_hyd: UnitHydId(0),
                reason: ParameterError::KernelTooLong { month: 0, term: 0, .. },
            }) => {}
            other => panic!("expected Kernel error, got {:?}", other.err()),
        }
    }

    #[test]
    fn short_final_step_uses_partial_kernel() {
        let table = RtkTable::uniform([
            Rtk::new(1.0, 2.0, 1.0),
            Rtk::default(),
            Rtk::default(),
        ]);
        let p = project(table, 1.0);
        let gen = RdiiGenerator::new(&p).unwrap().with_short_step(&p, 1_800.0).unwrap();
        let mut state = gen.initial_state();
        gen.step(&mut state, &[1.0], 0, 3_600.0);
        gen.step(&mut state, &[1.0], 0, 1_800.0);
        // Half-hour rain reaches 1/32 of its volume; the previous hour of
        // rain delivers 5/32 over the half hour.
        let expected = 0.25 / 8.0 + 2.0 * 5.0 / 32.0;
        assert!((state.unit_response()[0] - expected).abs() < 1e-12);
        // Full-length steps keep the regular kernel.
        let mut full = gen.initial_state();
        gen.step(&mut full, &[1.0], 0, 3_600.0);
        assert!((full.unit_response()[0] - 1.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn short_step_not_shorter_is_ignored() {
        let p = project(RtkTable::uniform([Rtk::new(0.5, 1.0, 1.0), Rtk::default(), Rtk::default()]), 1.0);
        let gen = RdiiGenerator::new(&p).unwrap().with_short_step(&p, 3_600.0).unwrap();
        assert!(gen.short_step.is_none());
    }
}
