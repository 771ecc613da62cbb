//! Integration test: a complete run driven only through the C ABI.
//!
//! Builds the RDII network of the fixtures with builder calls, runs it to
//! the end with a gage override and a pollutant override, and checks the
//! results against the same run made through the Rust API.

use std::ffi::CString;
use std::ptr;

use swale_core::{PollutantDef, RTK_VALUES};
use swale_engine::{Simulation, StaticLoader};
use swale_ffi::project::*;
use swale_ffi::run::*;
use swale_ffi::status::SwaleStatus;
use swale_ffi::types::*;
use swale_test_utils::fixtures;

const OK: i32 = SwaleStatus::Ok as i32;

fn cs(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// The fixture RDII network plus one pollutant, built through the ABI.
fn build_project() -> u64 {
    let mut p = 0u64;
    assert_eq!(
        swale_project_create(2007, 7, 1, 3.0 * 86_400.0, 900.0, SwaleUnitSystem::Us as i32, &mut p),
        OK
    );

    let times = [0.0, 3_600.0, 7_200.0, 10_800.0, 14_400.0];
    let rain = [0.0, 0.25, 0.5, 0.25, 0.0];
    let mut g = u32::MAX;
    let rg = cs("RG1");
    assert_eq!(
        swale_project_add_gage(p, rg.as_ptr(), times.as_ptr(), rain.as_ptr(), ptr::null(), 5, &mut g),
        OK
    );

    let rtk = fixtures::typical_rtk().to_flat();
    assert_eq!(rtk.len(), RTK_VALUES);
    let mut uh = u32::MAX;
    let uh1 = cs("UH1");
    assert_eq!(
        swale_project_add_unit_hydrograph(p, uh1.as_ptr(), g, rtk.as_ptr(), rtk.len(), &mut uh),
        OK
    );

    let mut idx = [u32::MAX; 3];
    for (i, (name, kind)) in [("J1", SwaleNodeKind::Junction), ("J2", SwaleNodeKind::Junction), ("OUT", SwaleNodeKind::Outfall)]
        .into_iter()
        .enumerate()
    {
        let id = cs(name);
        assert_eq!(swale_project_add_node(p, id.as_ptr(), kind as i32, 0.0, &mut idx[i]), OK);
    }
    assert_eq!(idx, [0, 1, 2]);
    assert_eq!(swale_project_set_node_rdii(p, 0, uh, 100.0), OK);

    let s1 = cs("S1");
    assert_eq!(
        swale_project_add_subcatchment(p, s1.as_ptr(), g, 0, 5.0, 0.05, 1.5, ptr::null_mut()),
        OK
    );
    let (c1, c2) = (cs("C1"), cs("C2"));
    assert_eq!(swale_project_add_link(p, c1.as_ptr(), 0, 1, 800.0, 1.5, ptr::null_mut()), OK);
    assert_eq!(swale_project_add_link(p, c2.as_ptr(), 1, 2, 600.0, 1.5, ptr::null_mut()), OK);

    let tss = cs("TSS");
    assert_eq!(swale_project_add_pollutant(p, tss.as_ptr(), 0.0, 0.0, ptr::null_mut()), OK);
    p
}

fn rust_reference() -> Simulation {
    let mut project = fixtures::rdii_network(fixtures::typical_rtk());
    project.add_pollutant("TSS", PollutantDef::default());
    let mut sim = Simulation::with_reference_models(StaticLoader::new(project));
    sim.open("ref.inp", "ref.rpt", "ref.out").unwrap();
    sim
}

#[test]
fn full_run_matches_the_rust_api() {
    let project = build_project();
    let mut run = 0u64;
    assert_eq!(swale_run_create(project, &mut run), OK);
    let (inp, rpt, out) = (cs("c.inp"), cs("c.rpt"), cs("c.out"));

    // Before open everything is NotOpen.
    let mut count = 0usize;
    assert_eq!(
        swale_object_count(run, SwaleObjectKind::Node as i32, &mut count),
        SwaleStatus::NotOpen as i32
    );

    assert_eq!(swale_open(run, inp.as_ptr(), rpt.as_ptr(), out.as_ptr()), OK);
    assert_eq!(swale_object_count(run, SwaleObjectKind::Node as i32, &mut count), OK);
    assert_eq!(count, 3);

    let mut j2 = u32::MAX;
    let name = cs("J2");
    assert_eq!(swale_object_index(run, SwaleObjectKind::Node as i32, name.as_ptr(), &mut j2), OK);
    assert_eq!(j2, 1);
    let missing = cs("J9");
    assert_eq!(
        swale_object_index(run, SwaleObjectKind::Node as i32, missing.as_ptr(), &mut j2),
        SwaleStatus::UnknownId as i32
    );

    // Read the RTK table back, then try an inadmissible one.
    let mut table = [0.0; RTK_VALUES];
    assert_eq!(
        swale_get_rdii_params(run, 0, table.as_mut_ptr(), 10),
        SwaleStatus::BufferTooSmall as i32
    );
    assert_eq!(swale_get_rdii_params(run, 0, table.as_mut_ptr(), table.len()), OK);
    assert_eq!(table.to_vec(), fixtures::typical_rtk().to_flat());
    let mut bad = table;
    bad[0] = 0.95;
    assert_eq!(
        swale_set_rdii_params(run, 0, bad.as_ptr(), bad.len()),
        SwaleStatus::RatioViolation as i32
    );

    let mut reference = rust_reference();
    reference.start(false).unwrap();
    assert_eq!(swale_start(run, 1), OK);
    assert_eq!(
        swale_set_rdii_params(run, 0, table.as_ptr(), table.len()),
        SwaleStatus::Running as i32
    );

    let mut steps = 0;
    loop {
        if steps == 20 {
            assert_eq!(swale_set_precipitation(run, 0, 0.8), OK);
            reference.set_precipitation(0, 0.8).unwrap();
            assert_eq!(
                swale_set_node_pollut(run, 1, SwaleOverrideMode::Persistent as i32, 0, 4.0),
                OK
            );
            reference
                .set_node_pollut_with_mode(1, swale_core::OverrideMode::Persistent, 0, 4.0)
                .unwrap();
        }
        let mut elapsed = -1.0;
        assert_eq!(swale_step(run, &mut elapsed), OK);
        let expected = reference.step().unwrap();
        assert_eq!(elapsed, expected);
        steps += 1;

        let mut flow = f64::NAN;
        assert_eq!(swale_get_link_result(run, 1, SwaleLinkResult::Flow as i32, &mut flow), OK);
        assert_eq!(flow, reference.link_result(1, swale_core::LinkResult::Flow).unwrap());

        if elapsed == 0.0 {
            break;
        }
    }
    assert_eq!(steps, 288);

    let mut elapsed = 0.0;
    assert_eq!(swale_step(run, &mut elapsed), SwaleStatus::NotRunning as i32);

    let mut qual = [f64::NAN; 2];
    let mut n = 0usize;
    assert_eq!(
        swale_get_node_pollut(run, 1, SwalePollutantProperty::Qual as i32, qual.as_mut_ptr(), 2, &mut n),
        OK
    );
    assert_eq!((n, qual[0]), (1, 4.0));

    let mut stats = SwaleSubcatchStats::default();
    assert_eq!(swale_get_subcatch_stats(run, 0, &mut stats), SwaleStatus::Running as i32);
    assert_eq!(swale_end(run), OK);
    reference.end().unwrap();
    assert_eq!(swale_get_subcatch_stats(run, 0, &mut stats), OK);
    assert_eq!(stats, SwaleSubcatchStats::from(reference.subcatch_stats(0).unwrap()));

    let mut totals = SwaleRoutingTotals::default();
    assert_eq!(swale_get_routing_totals(run, &mut totals), OK);
    assert!(totals.rdii_volume > 0.0);
    assert!(totals.continuity_error.abs() < 1e-9);

    let mut phase = -1;
    assert_eq!(swale_close(run), OK);
    assert_eq!(swale_phase(run, &mut phase), OK);
    assert_eq!(phase, SwalePhase::Closed as i32);

    assert_eq!(swale_project_destroy(run), SwaleStatus::InvalidHandle as i32);
    assert_eq!(swale_run_destroy(project), SwaleStatus::InvalidHandle as i32);
    assert_eq!(swale_run_destroy(run), OK);
    assert_eq!(swale_step(run, &mut elapsed), SwaleStatus::InvalidHandle as i32);
    assert_eq!(swale_project_destroy(project), OK);
}

#[test]
fn runs_from_one_builder_are_independent() {
    let project = build_project();
    let (mut a, mut b) = (0u64, 0u64);
    assert_eq!(swale_run_create(project, &mut a), OK);
    assert_eq!(swale_run_create(project, &mut b), OK);
    assert_eq!(swale_project_destroy(project), OK);

    let name = cs("x");
    for run in [a, b] {
        assert_eq!(swale_open(run, name.as_ptr(), name.as_ptr(), name.as_ptr()), OK);
    }
    assert_eq!(swale_set_node_param(a, 1, SwaleNodeParam::UnitHydrograph as i32, 0.0), OK);
    let mut value = 0.0;
    assert_eq!(swale_get_node_param(b, 1, SwaleNodeParam::UnitHydrograph as i32, &mut value), OK);
    assert_eq!(value, -1.0);
    assert_eq!(
        swale_get_node_param(b, 1, 7, &mut value),
        SwaleStatus::InvalidSelector as i32
    );

    for run in [a, b] {
        assert_eq!(swale_start(run, 0), OK);
        let mut elapsed = 0.0;
        assert_eq!(swale_step(run, &mut elapsed), OK);
        let mut metrics = SwaleStepMetrics::default();
        assert_eq!(swale_step_metrics(run, &mut metrics), OK);
        assert_eq!(metrics.step_index, 0);
        assert_eq!(swale_run_destroy(run), OK);
    }
}
