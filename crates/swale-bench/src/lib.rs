//! Benchmark networks for the Swale drainage kernel.
//!
//! - [`reference_network`]: a trunk sewer of `n` junctions, each with a
//!   subcatchment and RDII, one pollutant, two days at five-minute steps.
//! - [`stress_network`]: the same at 2 000 junctions and three pollutants.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use smallvec::smallvec;
use swale_core::{
    DirectInflow, GageDef, LandPollutant, LinkDef, NodeDef, NodeKind, PollutantDef,
    PrecipSample, Project, RdiiInflow, Rtk, RtkTable, SimOptions, StartDate, SubcatchDef,
    UnitHydDef, UnitSystem,
};

/// A six-hour design storm sampled every 15 minutes.
fn design_storm() -> GageDef {
    let series = (0..=24)
        .map(|i| {
            let x = i as f64 / 24.0;
            PrecipSample {
                time_secs: i as f64 * 900.0,
                rain: 1.2 * (std::f64::consts::PI * x).sin().max(0.0),
                snow: 0.0,
            }
        })
        .collect();
    GageDef { series }
}

fn network(junctions: usize, pollutants: usize) -> Project {
    let mut p = Project::new(SimOptions {
        start: StartDate {
            year: 2010,
            month: 4,
            day: 1,
        },
        duration_secs: 2.0 * 86_400.0,
        step_secs: 300.0,
        units: UnitSystem::Us,
    });
    let gage = p.add_gage("RG1", design_storm());
    for k in 0..pollutants {
        p.add_pollutant(
            format!("P{k}"),
            PollutantDef {
                rain_conc: 0.0,
                decay: 0.1 * k as f64,
            },
        );
    }
    let uh = p.add_unit_hydrograph(
        "UH1",
        UnitHydDef {
            gage,
            rtk: RtkTable::uniform([
                Rtk::new(0.01, 0.5, 2.0),
                Rtk::new(0.02, 3.0, 3.0),
                Rtk::new(0.03, 12.0, 4.0),
            ]),
        },
    );

    let mut previous = None;
    for i in 0..junctions {
        let node = p.add_node(
            format!("J{i}"),
            NodeDef {
                rdii: Some(RdiiInflow {
                    unit_hyd: uh,
                    area: 20.0,
                }),
                direct: (i % 10 == 0).then(|| DirectInflow {
                    flow: 0.1,
                    conc: smallvec![5.0; pollutants],
                }),
                ..NodeDef::default()
            },
        );
        p.add_subcatchment(
            format!("S{i}"),
            SubcatchDef {
                gage,
                outlet: node,
                area: 4.0,
                depression_storage: 0.05,
                reservoir_coeff: 1.0,
                pollutants: vec![
                    LandPollutant {
                        buildup_max: 40.0,
                        buildup_rate: 0.3,
                        initial_buildup: 10.0,
                        washoff_coeff: 0.1,
                        washoff_exp: 1.5,
                    };
                    pollutants
                ],
            },
        );
        if let Some(up) = previous {
            p.add_link(
                format!("C{i}"),
                LinkDef {
                    from: up,
                    to: node,
                    length: 300.0,
                    velocity: 2.0,
                },
            );
        }
        previous = Some(node);
    }
    if let Some(last) = previous {
        let out = p.add_node(
            "OUT",
            NodeDef {
                kind: NodeKind::Outfall,
                ..NodeDef::default()
            },
        );
        p.add_link(
            "C_OUT",
            LinkDef {
                from: last,
                to: out,
                length: 300.0,
                velocity: 2.0,
            },
        );
    }
    p
}

/// A trunk sewer of `junctions` nodes draining to one outfall.
pub fn reference_network(junctions: usize) -> Project {
    network(junctions, 1)
}

/// 2 000 junctions with three pollutants.
pub fn stress_network() -> Project {
    network(2_000, 3)
}
