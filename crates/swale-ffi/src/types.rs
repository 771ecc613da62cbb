//! C-compatible selector enums and statistics records.
//!
//! Selectors cross the ABI as plain `i32` and are decoded here; a value
//! outside the enum is an `InvalidSelector` error, never undefined
//! behaviour. The enums exist so the generated header names the values.

use swale_core::{
    IndexError, LinkResult, NodeKind, NodeParam, NodeResult, ObjectKind, OverrideMode,
    PollutantProperty, PrecipKind, SubcatchPollutant, SubcatchResult, UnitSystem,
};
use swale_engine::{LinkStats, NodeStats, RoutingTotals, RunPhase, SubcatchStats};

fn selector(name: &'static str, value: i32) -> IndexError {
    IndexError::Selector { name, value }
}

// ── Selectors ───────────────────────────────────────────────────

/// Entity table for `swale_object_index` and `swale_object_count`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleObjectKind {
    /// Rain gages.
    Gage = 0,
    /// Subcatchments.
    Subcatchment = 1,
    /// Nodes.
    Node = 2,
    /// Links.
    Link = 3,
    /// Pollutants.
    Pollutant = 4,
    /// Unit hydrographs.
    UnitHydrograph = 5,
}

pub(crate) fn object_kind(value: i32) -> Result<ObjectKind, IndexError> {
    Ok(match value {
        x if x == SwaleObjectKind::Gage as i32 => ObjectKind::Gage,
        x if x == SwaleObjectKind::Subcatchment as i32 => ObjectKind::Subcatchment,
        x if x == SwaleObjectKind::Node as i32 => ObjectKind::Node,
        x if x == SwaleObjectKind::Link as i32 => ObjectKind::Link,
        x if x == SwaleObjectKind::Pollutant as i32 => ObjectKind::Pollutant,
        x if x == SwaleObjectKind::UnitHydrograph as i32 => ObjectKind::UnitHydrograph,
        _ => return Err(selector("object kind", value)),
    })
}

/// Gage reading component.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwalePrecipKind {
    /// Rainfall rate.
    Rainfall = 0,
    /// Snowfall rate.
    Snowfall = 1,
    /// Total rate.
    Total = 2,
}

pub(crate) fn precip_kind(value: i32) -> Result<PrecipKind, IndexError> {
    Ok(match value {
        x if x == SwalePrecipKind::Rainfall as i32 => PrecipKind::Rainfall,
        x if x == SwalePrecipKind::Snowfall as i32 => PrecipKind::Snowfall,
        x if x == SwalePrecipKind::Total as i32 => PrecipKind::Total,
        _ => return Err(selector("precipitation kind", value)),
    })
}

/// Node RDII parameter.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleNodeParam {
    /// Sewershed area contributing RDII.
    RdiiArea = 0,
    /// Assigned unit hydrograph index, `-1` for none.
    UnitHydrograph = 1,
}

pub(crate) fn node_param(value: i32) -> Result<NodeParam, IndexError> {
    Ok(match value {
        x if x == SwaleNodeParam::RdiiArea as i32 => NodeParam::RdiiArea,
        x if x == SwaleNodeParam::UnitHydrograph as i32 => NodeParam::UnitHydrograph,
        _ => return Err(selector("node parameter", value)),
    })
}

/// Subcatchment pollutant property.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleSubcatchPollutant {
    /// Surface buildup mass.
    Buildup = 0,
    /// Ponded-water concentration.
    Ponded = 1,
    /// Runoff concentration.
    RunoffQual = 2,
    /// Cumulative washed-off load.
    TotalLoad = 3,
}

pub(crate) fn subcatch_pollutant(value: i32) -> Result<SubcatchPollutant, IndexError> {
    Ok(match value {
        x if x == SwaleSubcatchPollutant::Buildup as i32 => SubcatchPollutant::Buildup,
        x if x == SwaleSubcatchPollutant::Ponded as i32 => SubcatchPollutant::Ponded,
        x if x == SwaleSubcatchPollutant::RunoffQual as i32 => SubcatchPollutant::RunoffQual,
        x if x == SwaleSubcatchPollutant::TotalLoad as i32 => SubcatchPollutant::TotalLoad,
        _ => return Err(selector("subcatchment pollutant property", value)),
    })
}

/// Node or link pollutant property.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwalePollutantProperty {
    /// Resident concentration.
    Qual = 0,
    /// Inflow concentration.
    Cin = 1,
    /// Cumulative load.
    TotalLoad = 2,
}

pub(crate) fn pollutant_property(value: i32) -> Result<PollutantProperty, IndexError> {
    Ok(match value {
        x if x == SwalePollutantProperty::Qual as i32 => PollutantProperty::Qual,
        x if x == SwalePollutantProperty::Cin as i32 => PollutantProperty::Cin,
        x if x == SwalePollutantProperty::TotalLoad as i32 => PollutantProperty::TotalLoad,
        _ => return Err(selector("pollutant property", value)),
    })
}

/// Lifetime of a pollutant override.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleOverrideMode {
    /// Applies to the next step only.
    OneStep = 0,
    /// Applies until cleared.
    Persistent = 1,
}

pub(crate) fn override_mode(value: i32) -> Result<OverrideMode, IndexError> {
    Ok(match value {
        x if x == SwaleOverrideMode::OneStep as i32 => OverrideMode::OneStep,
        x if x == SwaleOverrideMode::Persistent as i32 => OverrideMode::Persistent,
        _ => return Err(selector("override mode", value)),
    })
}

/// Subcatchment hydrology result.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleSubcatchResult {
    /// Rainfall rate received.
    Rainfall = 0,
    /// Ponded depth.
    Depth = 1,
    /// Runoff flow.
    Runoff = 2,
}

pub(crate) fn subcatch_result(value: i32) -> Result<SubcatchResult, IndexError> {
    Ok(match value {
        x if x == SwaleSubcatchResult::Rainfall as i32 => SubcatchResult::Rainfall,
        x if x == SwaleSubcatchResult::Depth as i32 => SubcatchResult::Depth,
        x if x == SwaleSubcatchResult::Runoff as i32 => SubcatchResult::Runoff,
        _ => return Err(selector("subcatchment result", value)),
    })
}

/// Node hydraulic result.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleNodeResult {
    /// Water depth.
    Depth = 0,
    /// Stored volume.
    Volume = 1,
    /// Total inflow.
    Inflow = 2,
    /// Outflow.
    Outflow = 3,
    /// Lateral inflow.
    LateralInflow = 4,
    /// RDII inflow.
    RdiiInflow = 5,
}

pub(crate) fn node_result(value: i32) -> Result<NodeResult, IndexError> {
    Ok(match value {
        x if x == SwaleNodeResult::Depth as i32 => NodeResult::Depth,
        x if x == SwaleNodeResult::Volume as i32 => NodeResult::Volume,
        x if x == SwaleNodeResult::Inflow as i32 => NodeResult::Inflow,
        x if x == SwaleNodeResult::Outflow as i32 => NodeResult::Outflow,
        x if x == SwaleNodeResult::LateralInflow as i32 => NodeResult::LateralInflow,
        x if x == SwaleNodeResult::RdiiInflow as i32 => NodeResult::RdiiInflow,
        _ => return Err(selector("node result", value)),
    })
}

/// Link hydraulic result.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleLinkResult {
    /// Flow rate.
    Flow = 0,
    /// Flow depth.
    Depth = 1,
    /// Water volume.
    Volume = 2,
}

pub(crate) fn link_result(value: i32) -> Result<LinkResult, IndexError> {
    Ok(match value {
        x if x == SwaleLinkResult::Flow as i32 => LinkResult::Flow,
        x if x == SwaleLinkResult::Depth as i32 => LinkResult::Depth,
        x if x == SwaleLinkResult::Volume as i32 => LinkResult::Volume,
        _ => return Err(selector("link result", value)),
    })
}

/// Node type for the project builder.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleNodeKind {
    /// Junction without storage.
    Junction = 0,
    /// Terminal outfall.
    Outfall = 1,
    /// Storage unit; takes a detention time in hours.
    Storage = 2,
}

pub(crate) fn node_kind(value: i32, detention_hours: f64) -> Result<NodeKind, IndexError> {
    Ok(match value {
        x if x == SwaleNodeKind::Junction as i32 => NodeKind::Junction,
        x if x == SwaleNodeKind::Outfall as i32 => NodeKind::Outfall,
        x if x == SwaleNodeKind::Storage as i32 => NodeKind::Storage { detention_hours },
        _ => return Err(selector("node kind", value)),
    })
}

/// Unit system of a project.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleUnitSystem {
    /// US customary.
    Us = 0,
    /// SI.
    Si = 1,
}

pub(crate) fn unit_system(value: i32) -> Result<UnitSystem, IndexError> {
    Ok(match value {
        x if x == SwaleUnitSystem::Us as i32 => UnitSystem::Us,
        x if x == SwaleUnitSystem::Si as i32 => UnitSystem::Si,
        _ => return Err(selector("unit system", value)),
    })
}

/// Run lifecycle phase reported by `swale_phase`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwalePhase {
    /// No project loaded.
    Closed = 0,
    /// Project loaded.
    Opened = 1,
    /// Stepping.
    Running = 2,
    /// Run finished.
    Ended = 3,
}

impl From<RunPhase> for SwalePhase {
    fn from(phase: RunPhase) -> Self {
        match phase {
            RunPhase::Closed => SwalePhase::Closed,
            RunPhase::Opened => SwalePhase::Opened,
            RunPhase::Running => SwalePhase::Running,
            RunPhase::Ended => SwalePhase::Ended,
        }
    }
}

// ── Statistics ──────────────────────────────────────────────────

/// Totals of one subcatchment.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwaleSubcatchStats {
    /// Total precipitation depth.
    pub precip: f64,
    /// Runoff volume.
    pub runoff_volume: f64,
    /// Peak runoff flow.
    pub peak_runoff: f64,
}

impl From<SubcatchStats> for SwaleSubcatchStats {
    fn from(s: SubcatchStats) -> Self {
        Self {
            precip: s.precip,
            runoff_volume: s.runoff_volume,
            peak_runoff: s.peak_runoff,
        }
    }
}

/// Totals of one node.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwaleNodeStats {
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

impl From<NodeStats> for SwaleNodeStats {
    fn from(s: NodeStats) -> Self {
        Self {
            inflow_volume: s.inflow_volume,
            lateral_volume: s.lateral_volume,
            rdii_volume: s.rdii_volume,
            peak_inflow: s.peak_inflow,
            max_depth: s.max_depth,
        }
    }
}

/// Totals of one link.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwaleLinkStats {
    /// Volume conveyed.
    pub flow_volume: f64,
    /// Peak absolute flow.
    pub peak_flow: f64,
}

impl From<LinkStats> for SwaleLinkStats {
    fn from(s: LinkStats) -> Self {
        Self {
            flow_volume: s.flow_volume,
            peak_flow: s.peak_flow,
        }
    }
}

/// Network volume balance.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwaleRoutingTotals {
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
    /// Node storage at the end of the run.
    pub final_storage: f64,
    /// `(inflow - outflow - storage change) / inflow`.
    pub continuity_error: f64,
}

impl From<RoutingTotals> for SwaleRoutingTotals {
    fn from(t: RoutingTotals) -> Self {
        Self {
            runoff_volume: t.runoff_volume,
            rdii_volume: t.rdii_volume,
            direct_volume: t.direct_volume,
            outflow_volume: t.outflow_volume,
            initial_storage: t.initial_storage,
            final_storage: t.final_storage,
            continuity_error: t.continuity_error(),
        }
    }
}

// Layout assertions for ABI stability.
const _: () = assert!(std::mem::size_of::<SwaleSubcatchStats>() == 24);
const _: () = assert!(std::mem::size_of::<SwaleNodeStats>() == 40);
const _: () = assert!(std::mem::size_of::<SwaleLinkStats>() == 16);
const _: () = assert!(std::mem::size_of::<SwaleRoutingTotals>() == 56);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_decode_their_own_values() {
        assert_eq!(object_kind(SwaleObjectKind::Link as i32), Ok(ObjectKind::Link));
        assert_eq!(precip_kind(SwalePrecipKind::Total as i32), Ok(PrecipKind::Total));
        assert_eq!(
            override_mode(SwaleOverrideMode::Persistent as i32),
            Ok(OverrideMode::Persistent)
        );
        assert_eq!(
            node_kind(SwaleNodeKind::Storage as i32, 3.0),
            Ok(NodeKind::Storage { detention_hours: 3.0 })
        );
    }

    #[test]
    fn unknown_selector_is_reported_with_its_value() {
        assert_eq!(
            node_result(6),
            Err(IndexError::Selector {
                name: "node result",
                value: 6
            })
        );
        assert!(object_kind(-1).is_err());
        assert!(unit_system(2).is_err());
    }

    #[test]
    fn routing_totals_carry_continuity() {
        let t = RoutingTotals {
            runoff_volume: 100.0,
            outflow_volume: 90.0,
            final_storage: 5.0,
            ..RoutingTotals::default()
        };
        let c = SwaleRoutingTotals::from(t);
        assert!((c.continuity_error - 0.05).abs() < 1e-12);
    }
}
