//! Run statistics, accumulated every step and frozen at end of run.

use swale_core::{LinkHydraulics, NodeHydraulics, Project, SurfaceState};

/// Totals of one subcatchment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubcatchStats {
    /// Total precipitation depth.
    pub precip: f64,
    /// Runoff volume.
    pub runoff_volume: f64,
    /// Peak runoff flow.
    pub peak_runoff: f64,
}

/// Totals of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Total inflow volume.
    pub inflow_volume: f64,
    /// Lateral inflow volume.
    pub lateral_volume: f64,
    /// RDII volume.
    pub rdii_volume: f64,
    /// Peak total inflow.
    pub peak_inflow: f64,
    /// Maximum depth.
    pub max_depth: f64,
}

/// Totals of one link.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkStats {
    /// Volume conveyed in either direction.
    pub flow_volume: f64,
    /// Peak absolute flow.
    pub peak_flow: f64,
}

/// System-wide volume balance of the routed network.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoutingTotals {
    /// Runoff volume entering the network.
    pub runoff_volume: f64,
    /// RDII volume entering the network.
    pub rdii_volume: f64,
    /// Direct inflow volume entering the network.
    pub direct_volume: f64,
    /// Volume leaving through terminal nodes.
    pub outflow_volume: f64,
    /// Node storage at the start of the run.
    pub initial_storage: f64,
    /// Node storage after the latest step.
    pub final_storage: f64,
}

impl RoutingTotals {
    /// Total volume entering the network.
    pub fn inflow_volume(&self) -> f64 {
        self.runoff_volume + self.rdii_volume + self.direct_volume
    }

    /// `(inflow − outflow − Δstorage) / inflow`; zero without inflow.
    pub fn continuity_error(&self) -> f64 {
        let inflow = self.inflow_volume();
        if inflow <= 0.0 {
            return 0.0;
        }
        let stored = self.final_storage - self.initial_storage;
        (inflow - self.outflow_volume - stored) / inflow
    }
}

/// State of one committed step, as seen by the statistics.
pub struct StepSample<'a> {
    /// Step length, seconds.
    pub dt: f64,
    /// Precipitation rate per subcatchment.
    pub precip: &'a [f64],
    /// Surfaces after runoff.
    pub surfaces: &'a [SurfaceState],
    /// RDII inflow per node.
    pub rdii: &'a [f64],
    /// Direct inflow per node.
    pub direct: &'a [f64],
    /// Nodes after routing.
    pub nodes: &'a [NodeHydraulics],
    /// Links after routing.
    pub links: &'a [LinkHydraulics],
    /// Whether each node discharges out of the network.
    pub terminal: &'a [bool],
}

/// All statistics of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStatistics {
    /// Per subcatchment.
    pub subcatchments: Vec<SubcatchStats>,
    /// Per node.
    pub nodes: Vec<NodeStats>,
    /// Per link.
    pub links: Vec<LinkStats>,
    /// Network balance.
    pub routing: RoutingTotals,
}

impl RunStatistics {
    /// Zeroed statistics sized to a project.
    pub fn new(project: &Project) -> Self {
        Self {
            subcatchments: vec![SubcatchStats::default(); project.subcatchments.len()],
            nodes: vec![NodeStats::default(); project.nodes.len()],
            links: vec![LinkStats::default(); project.links.len()],
            routing: RoutingTotals::default(),
        }
    }

    /// Fold one step into the totals.
    pub fn accumulate(&mut self, s: &StepSample<'_>) {
        let dt = s.dt;
        let hours = dt / 3_600.0;
        for ((stats, &rate), surface) in self
            .subcatchments
            .iter_mut()
            .zip(s.precip)
            .zip(s.surfaces)
        {
            stats.precip += rate * hours;
            stats.runoff_volume += surface.runoff * dt;
            stats.peak_runoff = stats.peak_runoff.max(surface.runoff);
            self.routing.runoff_volume += surface.runoff * dt;
        }

        let mut storage = 0.0;
        for (i, (stats, node)) in self.nodes.iter_mut().zip(s.nodes).enumerate() {
            let rdii = s.rdii.get(i).copied().unwrap_or(0.0);
            stats.inflow_volume += node.inflow * dt;
            stats.lateral_volume += node.lateral_inflow * dt;
            stats.rdii_volume += rdii * dt;
            stats.peak_inflow = stats.peak_inflow.max(node.inflow);
            stats.max_depth = stats.max_depth.max(node.depth);
            self.routing.rdii_volume += rdii * dt;
            self.routing.direct_volume += s.direct.get(i).copied().unwrap_or(0.0) * dt;
            if s.terminal.get(i).copied().unwrap_or(false) {
                self.routing.outflow_volume += node.outflow * dt;
            }
            storage += node.volume;
        }
        self.routing.final_storage = storage;

        for (stats, link) in self.links.iter_mut().zip(s.links) {
            let q = link.flow.abs();
            stats.flow_volume += q * dt;
            stats.peak_flow = stats.peak_flow.max(q);
        }
    }
}
