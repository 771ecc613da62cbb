//! The mutable state of a run, staged and committed as one unit.

use smallvec::SmallVec;
use swale_core::{LinkHydraulics, NodeHydraulics, Project, SurfaceState};
use swale_quality::QualityState;
use swale_rdii::{RdiiGenerator, RdiiState};

use crate::gage::GageReading;
use crate::stats::RunStatistics;

/// Everything a step changes.
///
/// The engine keeps two of these: the committed state and a staging copy
/// that each step writes into and swaps in on success.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkState {
    /// Steps committed so far.
    pub step_index: u64,
    /// Gage readings of the latest step.
    pub gages: Vec<GageReading>,
    /// Precipitation rate per subcatchment.
    pub precip: Vec<f64>,
    /// Land surfaces.
    pub surfaces: Vec<SurfaceState>,
    /// RDII histories and inflows.
    pub rdii: RdiiState,
    /// Lateral inflow per node.
    pub lateral: Vec<f64>,
    /// Node hydraulics.
    pub nodes: Vec<NodeHydraulics>,
    /// Link hydraulics.
    pub links: Vec<LinkHydraulics>,
    /// Pollutant state.
    pub quality: QualityState,
    /// Running totals.
    pub stats: RunStatistics,
}

impl NetworkState {
    /// State at the start of a run.
    pub fn initial(project: &Project, rdii: &RdiiGenerator) -> Self {
        let pollutants = project.pollutants.len();
        let surfaces = project
            .subcatchments
            .values()
            .map(|sc| {
                let buildup: SmallVec<[f64; 4]> = (0..pollutants)
                    .map(|p| sc.pollutants.get(p).map_or(0.0, |l| l.initial_buildup * sc.area))
                    .collect();
                SurfaceState {
                    washoff: SmallVec::from_elem(0.0, pollutants),
                    buildup,
                    ..SurfaceState::default()
                }
            })
            .collect();
        Self {
            step_index: 0,
            gages: vec![GageReading::default(); project.gages.len()],
            precip: vec![0.0; project.subcatchments.len()],
            surfaces,
            rdii: rdii.initial_state(),
            lateral: vec![0.0; project.nodes.len()],
            nodes: vec![NodeHydraulics::default(); project.nodes.len()],
            links: vec![LinkHydraulics::default(); project.links.len()],
            quality: QualityState::new(project),
            stats: RunStatistics::new(project),
        }
    }
}
