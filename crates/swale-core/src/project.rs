//! Static project topology and run options.
//!
//! A [`Project`] is what a loader produces: named entity tables plus the
//! options of the run. Tables are [`IndexMap`]s keyed by id, so the
//! position of an entry is its index and id lookup goes through the hash index.

use indexmap::IndexMap;

use crate::id::{GageId, LinkId, NodeId, PollutantId, SubcatchId, UnitHydId};
use crate::kinds::ObjectKind;
use crate::rtk::RtkTable;
use crate::state::PollutantVec;
use crate::units::UnitSystem;

// ── Options ────────────────────────────────────────────────────

/// Calendar date the run starts at (midnight).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartDate {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of month, 1 based.
    pub day: u32,
}

impl Default for StartDate {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
        }
    }
}

/// Options of one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Start date. Default: 2000-01-01.
    pub start: StartDate,
    /// Simulated duration, seconds. Default: one day.
    pub duration_secs: f64,
    /// Fixed step, seconds. Default: 60.
    pub step_secs: f64,
    /// Unit system. Default: US customary.
    pub units: UnitSystem,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            start: StartDate::default(),
            duration_secs: 86_400.0,
            step_secs: 60.0,
            units: UnitSystem::Us,
        }
    }
}

// ── Entity definitions ─────────────────────────────────────────

/// One sample of a gage's precipitation series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecipSample {
    /// Seconds since the start of the run.
    pub time_secs: f64,
    /// Rainfall rate.
    pub rain: f64,
    /// Snowfall rate.
    pub snow: f64,
}

/// A rain gage and its recorded series, held as a step function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GageDef {
    /// Samples in ascending time order.
    pub series: Vec<PrecipSample>,
}

impl GageDef {
    /// A gage reporting a constant rainfall rate from time zero.
    pub fn constant(rain: f64) -> Self {
        Self {
            series: vec![PrecipSample {
                time_secs: 0.0,
                rain,
                snow: 0.0,
            }],
        }
    }
}

/// Buildup and washoff parameters of one pollutant on one subcatchment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LandPollutant {
    /// Buildup at saturation, mass per unit area.
    pub buildup_max: f64,
    /// Exponential buildup rate, 1/day.
    pub buildup_rate: f64,
    /// Buildup at the start of the run, mass per unit area.
    pub initial_buildup: f64,
    /// Washoff coefficient.
    pub washoff_coeff: f64,
    /// Washoff exponent on the runoff rate.
    pub washoff_exp: f64,
}

/// A subcatchment.
#[derive(Clone, Debug, PartialEq)]
pub struct SubcatchDef {
    /// Gage supplying precipitation.
    pub gage: GageId,
    /// Node receiving runoff.
    pub outlet: NodeId,
    /// Area.
    pub area: f64,
    /// Depression storage depth.
    pub depression_storage: f64,
    /// Linear reservoir coefficient, 1/hour.
    pub reservoir_coeff: f64,
    /// Land pollutant parameters, one per project pollutant (missing
    /// entries mean no buildup).
    pub pollutants: Vec<LandPollutant>,
}

/// Hydraulic role of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum NodeKind {
    /// Junction without storage.
    #[default]
    Junction,
    /// Terminal node; outflow leaves the system.
    Outfall,
    /// Storage unit drained as a linear reservoir.
    Storage {
        /// Mean detention time, hours.
        detention_hours: f64,
    },
}

/// RDII assignment of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RdiiInflow {
    /// Unit hydrograph generating the inflow.
    pub unit_hyd: UnitHydId,
    /// Contributing sewershed area.
    pub area: f64,
}

/// Constant external inflow at a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectInflow {
    /// Flow rate.
    pub flow: f64,
    /// Concentration per pollutant, mg/L.
    pub conc: PollutantVec,
}

/// A conveyance node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDef {
    /// Hydraulic role.
    pub kind: NodeKind,
    /// Optional RDII assignment.
    pub rdii: Option<RdiiInflow>,
    /// Optional direct inflow.
    pub direct: Option<DirectInflow>,
}

/// A conveyance link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkDef {
    /// Upstream node.
    pub from: NodeId,
    /// Downstream node.
    pub to: NodeId,
    /// Length.
    pub length: f64,
    /// Mean velocity, length per second.
    pub velocity: f64,
}

impl LinkDef {
    /// Travel time through the link, seconds.
    pub fn travel_secs(&self) -> f64 {
        if self.velocity > 0.0 {
            self.length / self.velocity
        } else {
            0.0
        }
    }
}

/// A tracked pollutant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PollutantDef {
    /// Concentration in rainfall, mg/L.
    pub rain_conc: f64,
    /// First-order decay coefficient, 1/day.
    pub decay: f64,
}

/// A unit hydrograph.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitHydDef {
    /// Gage whose rainfall drives the hydrograph.
    pub gage: GageId,
    /// Response parameters.
    pub rtk: RtkTable,
}

// ── Project ────────────────────────────────────────────────────

/// Static topology and options of a model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Project {
    /// Run options.
    pub options: SimOptions,
    /// Rain gages.
    pub gages: IndexMap<String, GageDef>,
    /// Subcatchments.
    pub subcatchments: IndexMap<String, SubcatchDef>,
    /// Nodes.
    pub nodes: IndexMap<String, NodeDef>,
    /// Links.
    pub links: IndexMap<String, LinkDef>,
    /// Pollutants.
    pub pollutants: IndexMap<String, PollutantDef>,
    /// Unit hydrographs.
    pub unit_hydrographs: IndexMap<String, UnitHydDef>,
}

impl Project {
    /// An empty project with the given options.
    pub fn new(options: SimOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Add (or replace) a gage.
    pub fn add_gage(&mut self, id: impl Into<String>, def: GageDef) -> GageId {
        GageId(self.gages.insert_full(id.into(), def).0 as u32)
    }

    /// Add (or replace) a subcatchment.
    pub fn add_subcatchment(&mut self, id: impl Into<String>, def: SubcatchDef) -> SubcatchId {
        SubcatchId(self.subcatchments.insert_full(id.into(), def).0 as u32)
    }

    /// Add (or replace) a node.
    pub fn add_node(&mut self, id: impl Into<String>, def: NodeDef) -> NodeId {
        NodeId(self.nodes.insert_full(id.into(), def).0 as u32)
    }

    /// Add (or replace) a link.
    pub fn add_link(&mut self, id: impl Into<String>, def: LinkDef) -> LinkId {
        LinkId(self.links.insert_full(id.into(), def).0 as u32)
    }

    /// Add (or replace) a pollutant.
    pub fn add_pollutant(&mut self, id: impl Into<String>, def: PollutantDef) -> PollutantId {
        PollutantId(self.pollutants.insert_full(id.into(), def).0 as u32)
    }

    /// Add (or replace) a unit hydrograph.
    pub fn add_unit_hydrograph(&mut self, id: impl Into<String>, def: UnitHydDef) -> UnitHydId {
        UnitHydId(self.unit_hydrographs.insert_full(id.into(), def).0 as u32)
    }

    /// Number of entities of a kind.
    pub fn count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Gage => self.gages.len(),
            ObjectKind::Subcatchment => self.subcatchments.len(),
            ObjectKind::Node => self.nodes.len(),
            ObjectKind::Link => self.links.len(),
            ObjectKind::Pollutant => self.pollutants.len(),
            ObjectKind::UnitHydrograph => self.unit_hydrographs.len(),
        }
    }

    /// Index of the entity with this id.
    pub fn index_of(&self, kind: ObjectKind, id: &str) -> Option<u32> {
        let idx = match kind {
            ObjectKind::Gage => self.gages.get_index_of(id),
            ObjectKind::Subcatchment => self.subcatchments.get_index_of(id),
            ObjectKind::Node => self.nodes.get_index_of(id),
            ObjectKind::Link => self.links.get_index_of(id),
            ObjectKind::Pollutant => self.pollutants.get_index_of(id),
            ObjectKind::UnitHydrograph => self.unit_hydrographs.get_index_of(id),
        }?;
        Some(idx as u32)
    }

    /// Nodes ordered so every link runs from an earlier to a later node.
    ///
    /// Returns `Err(node)` with a node on a cycle when the link graph is
    /// not acyclic.
    pub fn node_order(&self) -> Result<Vec<NodeId>, NodeId> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];
        for link in self.links.values() {
            indegree[link.to.index()] += 1;
            downstream[link.from.index()].push(link.to.index());
        }
        let mut ready: Vec<usize> = (0..n).rev().filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop() {
            order.push(NodeId(i as u32));
            for &j in downstream[i].iter().rev() {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.push(j);
                }
            }
        }
        if order.len() < n {
            let stuck = (0..n).find(|&i| indegree[i] > 0).unwrap_or(0);
            return Err(NodeId(stuck as u32));
        }
        Ok(order)
    }

    /// Links grouped by their upstream node.
    pub fn outgoing_links(&self) -> Vec<Vec<LinkId>> {
        let mut out = vec![Vec::new(); self.nodes.len()];
        for (i, link) in self.links.values().enumerate() {
            out[link.from.index()].push(LinkId(i as u32));
        }
        out
    }

    /// Links grouped by their downstream node.
    pub fn incoming_links(&self) -> Vec<Vec<LinkId>> {
        let mut out = vec![Vec::new(); self.nodes.len()];
        for (i, link) in self.links.values().enumerate() {
            out[link.to.index()].push(LinkId(i as u32));
        }
        out
    }

    /// Subcatchments grouped by outlet node.
    pub fn subcatchments_by_outlet(&self) -> Vec<Vec<SubcatchId>> {
        let mut out = vec![Vec::new(); self.nodes.len()];
        for (i, sc) in self.subcatchments.values().enumerate() {
            out[sc.outlet.index()].push(SubcatchId(i as u32));
        }
        out
    }
}
