//! Reusable fixture networks.
//!
//! - [`gage_network`]: one gage, one subcatchment, `J1 -> OUT`.
//! - [`rdii_network`]: a unit hydrograph feeding `J1` of `J1 -> J2 -> OUT`.
//! - [`pollutant_network`]: a direct inflow and a washed-off surface meeting
//!   in a storage unit.

use smallvec::smallvec;
use swale_core::{
    DirectInflow, GageDef, GageId, LandPollutant, LinkDef, NodeDef, NodeId, NodeKind,
    PollutantDef, PrecipSample, Project, RdiiInflow, Rtk, RtkTable, SimOptions, StartDate,
    SubcatchDef, UnitHydDef, UnitSystem,
};

/// A five-hour triangular storm peaking at `peak` in hour two.
pub fn storm(peak: f64) -> GageDef {
    let sample = |hour: f64, rain: f64| PrecipSample {
        time_secs: hour * 3_600.0,
        rain,
        snow: 0.0,
    };
    GageDef {
        series: vec![
            sample(0.0, 0.0),
            sample(1.0, peak * 0.5),
            sample(2.0, peak),
            sample(3.0, peak * 0.5),
            sample(4.0, 0.0),
        ],
    }
}

fn surface(gage: GageId, outlet: NodeId, area: f64) -> SubcatchDef {
    SubcatchDef {
        gage,
        outlet,
        area,
        depression_storage: 0.05,
        reservoir_coeff: 1.5,
        pollutants: Vec::new(),
    }
}

fn conduit(from: NodeId, to: NodeId, length: f64, velocity: f64) -> LinkDef {
    LinkDef {
        from,
        to,
        length,
        velocity,
    }
}

fn outfall() -> NodeDef {
    NodeDef {
        kind: NodeKind::Outfall,
        ..NodeDef::default()
    }
}

/// One day at one-minute steps, US units, starting 1998-01-01.
///
/// Gage `RG1` (storm peaking at 1 in/hr) feeds subcatchment `S1`, which
/// drains to `J1`; conduit `C1` carries `J1` to outfall `OUT`.
pub fn gage_network() -> Project {
    let mut p = Project::new(SimOptions {
        start: StartDate {
            year: 1998,
            month: 1,
            day: 1,
        },
        duration_secs: 86_400.0,
        step_secs: 60.0,
        units: UnitSystem::Us,
    });
    let g = p.add_gage("RG1", storm(1.0));
    let j1 = p.add_node("J1", NodeDef::default());
    let out = p.add_node("OUT", outfall());
    p.add_subcatchment("S1", surface(g, j1, 10.0));
    p.add_link("C1", conduit(j1, out, 400.0, 2.0));
    p
}

/// Short, medium and long responses with ΣR = 0.10 in every month.
pub fn typical_rtk() -> RtkTable {
    RtkTable::uniform([
        Rtk::new(0.02, 1.0, 2.0),
        Rtk::new(0.03, 4.0, 3.0),
        Rtk::new(0.05, 10.0, 3.0),
    ])
}

/// Three days at 15-minute steps, US units, starting 2007-07-01.
///
/// Unit hydrograph `UH1` (driven by `RG1`) injects RDII at `J1` over
/// 100 acres; `J2` has no RDII. Links `C1: J1 -> J2`, `C2: J2 -> OUT`.
pub fn rdii_network(rtk: RtkTable) -> Project {
    let mut p = Project::new(SimOptions {
        start: StartDate {
            year: 2007,
            month: 7,
            day: 1,
        },
        duration_secs: 3.0 * 86_400.0,
        step_secs: 900.0,
        units: UnitSystem::Us,
    });
    let g = p.add_gage("RG1", storm(0.5));
    let uh = p.add_unit_hydrograph("UH1", UnitHydDef { gage: g, rtk });
    let j1 = p.add_node(
        "J1",
        NodeDef {
            rdii: Some(RdiiInflow {
                unit_hyd: uh,
                area: 100.0,
            }),
            ..NodeDef::default()
        },
    );
    let j2 = p.add_node("J2", NodeDef::default());
    let out = p.add_node("OUT", outfall());
    p.add_subcatchment("S1", surface(g, j1, 5.0));
    p.add_link("C1", conduit(j1, j2, 800.0, 1.5));
    p.add_link("C2", conduit(j2, out, 600.0, 1.5));
    p
}

/// One day at five-minute steps, SI units, one pollutant `TSS`.
///
/// Nodes by index: `J1` (0) receives washoff from `S1`; `J2` (1) has a
/// direct inflow of 0.5 m³/s at 10 mg/L; storage `ST1` (2, two-hour
/// detention) receives `C1: J1 -> ST1` and `C2: J2 -> ST1`; culvert
/// `C3: ST1 -> OUT` discharges to outfall `OUT` (3).
pub fn pollutant_network() -> Project {
    let mut p = Project::new(SimOptions {
        start: StartDate::default(),
        duration_secs: 86_400.0,
        step_secs: 300.0,
        units: UnitSystem::Si,
    });
    let g = p.add_gage("RG1", storm(10.0));
    p.add_pollutant(
        "TSS",
        PollutantDef {
            rain_conc: 0.0,
            decay: 0.0,
        },
    );
    let j1 = p.add_node("J1", NodeDef::default());
    let j2 = p.add_node(
        "J2",
        NodeDef {
            direct: Some(DirectInflow {
                flow: 0.5,
                conc: smallvec![10.0],
            }),
            ..NodeDef::default()
        },
    );
    let st1 = p.add_node(
        "ST1",
        NodeDef {
            kind: NodeKind::Storage {
                detention_hours: 2.0,
            },
            ..NodeDef::default()
        },
    );
    let out = p.add_node("OUT", outfall());
    p.add_subcatchment(
        "S1",
        SubcatchDef {
            pollutants: vec![LandPollutant {
                buildup_max: 50.0,
                buildup_rate: 0.5,
                initial_buildup: 20.0,
                washoff_coeff: 0.2,
                washoff_exp: 1.2,
            }],
            ..surface(g, j1, 2.0)
        },
    );
    p.add_link("C1", conduit(j1, st1, 100.0, 1.0));
    p.add_link("C2", conduit(j2, st1, 200.0, 1.0));
    p.add_link("C3", conduit(st1, out, 50.0, 1.5));
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use swale_core::ObjectKind;

    #[test]
    fn pollutant_network_indices_are_stable() {
        let p = pollutant_network();
        assert_eq!(p.index_of(ObjectKind::Node, "J2"), Some(1));
        assert_eq!(p.index_of(ObjectKind::Node, "OUT"), Some(3));
        assert_eq!(p.index_of(ObjectKind::Link, "C2"), Some(1));
    }

    #[test]
    fn typical_rtk_is_admissible() {
        assert_eq!(typical_rtk().validate(), Ok(()));
    }
}
