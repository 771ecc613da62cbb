//! Per-entity state records exchanged with collaborator models.

use smallvec::SmallVec;

/// One value per pollutant. Projects rarely track more than a handful.
pub type PollutantVec = SmallVec<[f64; 4]>;

/// Land-surface state of a subcatchment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceState {
    /// Precipitation rate applied during the step.
    pub rainfall: f64,
    /// Ponded depth.
    pub depth: f64,
    /// Runoff flow leaving the subcatchment.
    pub runoff: f64,
    /// Buildup mass per pollutant.
    pub buildup: PollutantVec,
    /// Washoff mass rate per pollutant, mass per second.
    pub washoff: PollutantVec,
}

/// Hydraulic state of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeHydraulics {
    /// Water depth.
    pub depth: f64,
    /// Stored volume.
    pub volume: f64,
    /// Lateral inflow (runoff, RDII, direct inflow).
    pub lateral_inflow: f64,
    /// Total inflow including upstream links.
    pub inflow: f64,
    /// Total outflow.
    pub outflow: f64,
}

/// Hydraulic state of a link.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkHydraulics {
    /// Flow rate; negative when reversed.
    pub flow: f64,
    /// Flow depth.
    pub depth: f64,
    /// Volume in transit.
    pub volume: f64,
}
