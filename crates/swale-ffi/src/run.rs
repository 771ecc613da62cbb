//! Run FFI: lifecycle, stepping, live results, overrides and statistics.
//!
//! Each run sits behind its own `Arc<Mutex<Simulation>>`, so the global
//! `RUNS` table lock is held only for handle lookup and different runs
//! can be stepped concurrently from different threads.
//!
//! Selector arguments are decoded after the lifecycle check, keeping the
//! error precedence of the Rust API: phase, then index or selector, then
//! value.

use std::os::raw::c_char;
use std::sync::{Arc, Mutex};

use swale_core::{IndexError, Stage, RTK_VALUES};
use swale_engine::lifecycle::{BEFORE_END, LOADED, PRE_RUN, RUNNING};
use swale_engine::{ApiError, RunPhase, Simulation, StaticLoader, StepMetrics, TableLoader};

use crate::handle::{HandleKind, Handled, Registry};
use crate::project::projects;
use crate::status::SwaleStatus;
use crate::types::{self, SwaleLinkStats, SwaleNodeStats, SwalePhase, SwaleRoutingTotals, SwaleSubcatchStats};
use crate::{c_slice, c_str, status_of, write_buffer, write_out};

type RunArc = Arc<Mutex<Simulation>>;

impl Handled for RunArc {
    const KIND: HandleKind = HandleKind::Run;
}

static RUNS: Mutex<Registry<RunArc>> = Mutex::new(Registry::new());

/// Clone the Arc for a run handle, briefly locking the global table.
///
/// Returns `None` if the handle is invalid or the mutex is poisoned.
fn get_run(handle: u64) -> Option<RunArc> {
    RUNS.lock().ok()?.get(handle).cloned()
}

/// Call into the simulation behind `handle`, holding only its own lock.
fn with_run<T>(
    handle: u64,
    call: impl FnOnce(&mut Simulation) -> Result<T, ApiError>,
) -> Result<T, SwaleStatus> {
    let run = get_run(handle).ok_or(SwaleStatus::InvalidHandle)?;
    let mut sim = run.lock().map_err(|_| SwaleStatus::InternalError)?;
    call(&mut sim).map_err(|e| SwaleStatus::from(&e))
}

/// Check the phase, then decode a selector.
fn decode<T>(
    sim: &Simulation,
    allowed: &[RunPhase],
    selector: Result<T, IndexError>,
) -> Result<T, ApiError> {
    sim.lifecycle().require(allowed)?;
    Ok(selector?)
}

/// Read a scalar through `get` and write it to `out`.
fn read<T>(handle: u64, out: *mut T, get: impl FnOnce(&Simulation) -> Result<T, ApiError>) -> i32 {
    if out.is_null() {
        return SwaleStatus::InvalidArgument as i32;
    }
    status_of(with_run(handle, |sim| get(sim)).and_then(|v| write_out(out, v)))
}

/// Copy a per-pollutant array into a caller buffer.
fn read_array(
    handle: u64,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
    get: impl FnOnce(&Simulation) -> Result<Vec<f64>, ApiError>,
) -> i32 {
    status_of(with_run(handle, |sim| get(sim)).and_then(|v| write_buffer(&v, buf, cap, len_out)))
}

fn create(project: u64, with_tables: bool, out: *mut u64) -> i32 {
    if out.is_null() {
        return SwaleStatus::InvalidArgument as i32;
    }
    let project = match ffi_lock!(projects()).get(project) {
        Some(p) => p.clone(),
        None => return SwaleStatus::InvalidHandle as i32,
    };
    let sim = if with_tables {
        Simulation::with_reference_models(TableLoader::new(project))
    } else {
        Simulation::with_reference_models(StaticLoader::new(project))
    };
    match ffi_lock!(RUNS).insert(Arc::new(Mutex::new(sim))) {
        Some(handle) => status_of(write_out(out, handle)),
        None => SwaleStatus::AllocationFailed as i32,
    }
}

// ── Lifecycle ───────────────────────────────────────────────────

/// Create a closed run over a copy of a built project.
///
/// The builder stays valid and may seed further runs.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_run_create(project: u64, run_out: *mut u64) -> i32 {
    ffi_guard!({ create(project, false, run_out) })
}

/// Like [`swale_run_create`], but `swale_open` also reads unit-hydrograph
/// tables from the input file and merges them into the project.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_run_create_with_tables(project: u64, run_out: *mut u64) -> i32 {
    ffi_guard!({ create(project, true, run_out) })
}

/// Destroy a run, releasing all resources. An open run is dropped as is.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_run_destroy(run: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(RUNS).remove(run) {
            Some(_) => SwaleStatus::Ok as i32,
            None => SwaleStatus::InvalidHandle as i32,
        }
    })
}

/// Open the run: load and validate the project.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_open(
    run: u64,
    input: *const c_char,
    report: *const c_char,
    output: *const c_char,
) -> i32 {
    ffi_guard!({
        let paths = c_str(input).and_then(|i| Ok((i, c_str(report)?, c_str(output)?)));
        let (input, report, output) = match paths {
            Ok(p) => p,
            Err(status) => return status as i32,
        };
        status_of(with_run(run, |sim| sim.open(input, report, output)))
    })
}

/// Start stepping. `save_results` is nonzero to keep results.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_start(run: u64, save_results: i32) -> i32 {
    ffi_guard!({ status_of(with_run(run, |sim| sim.start(save_results != 0))) })
}

/// Advance one step. Writes elapsed days, or exactly 0 at the end.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_step(run: u64, elapsed_out: *mut f64) -> i32 {
    ffi_guard!({
        if elapsed_out.is_null() {
            return SwaleStatus::InvalidArgument as i32;
        }
        status_of(with_run(run, Simulation::step).and_then(|e| write_out(elapsed_out, e)))
    })
}

/// End the run and freeze its statistics.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_end(run: u64) -> i32 {
    ffi_guard!({ status_of(with_run(run, Simulation::end)) })
}

/// Close the run, ending it first if it is still stepping.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_close(run: u64) -> i32 {
    ffi_guard!({ status_of(with_run(run, Simulation::close)) })
}

/// Current phase as a `SwalePhase` value.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_phase(run: u64, phase_out: *mut i32) -> i32 {
    ffi_guard!({ read(run, phase_out, |sim| Ok(SwalePhase::from(sim.phase()) as i32)) })
}

/// Elapsed simulated days.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_elapsed_days(run: u64, days_out: *mut f64) -> i32 {
    ffi_guard!({ read(run, days_out, Simulation::elapsed_days) })
}

/// Wall-clock cost of the latest committed step.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwaleStepMetrics {
    /// Index of the step measured.
    pub step_index: u64,
    /// Whole step, microseconds.
    pub total_us: u64,
    /// Gage resolution, microseconds.
    pub gage_us: u64,
    /// Runoff, microseconds.
    pub runoff_us: u64,
    /// RDII convolution, microseconds.
    pub rdii_us: u64,
    /// Routing, microseconds.
    pub routing_us: u64,
    /// Pollutant transport, microseconds.
    pub quality_us: u64,
    /// Statistics, microseconds.
    pub statistics_us: u64,
}

impl SwaleStepMetrics {
    fn from_rust(m: &StepMetrics) -> Self {
        let us = |stage| m.stage(stage).unwrap_or(0);
        Self {
            step_index: m.step_index,
            total_us: m.total_us,
            gage_us: us(Stage::GageFeed),
            runoff_us: us(Stage::Runoff),
            rdii_us: us(Stage::Rdii),
            routing_us: us(Stage::Routing),
            quality_us: us(Stage::Quality),
            statistics_us: us(Stage::Statistics),
        }
    }
}

/// Step metrics of the latest committed step.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_step_metrics(run: u64, metrics_out: *mut SwaleStepMetrics) -> i32 {
    ffi_guard!({
        read(run, metrics_out, |sim| {
            sim.last_metrics().map(SwaleStepMetrics::from_rust)
        })
    })
}

// ── Lookup ──────────────────────────────────────────────────────

/// Index of the entity `id` of kind `kind` (a `SwaleObjectKind`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_object_index(
    run: u64,
    kind: i32,
    id: *const c_char,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s,
            Err(status) => return status as i32,
        };
        read(run, index_out, |sim| {
            let kind = decode(sim, LOADED, types::object_kind(kind))?;
            sim.object_index(kind, id)
        })
    })
}

/// Number of entities of kind `kind`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_object_count(run: u64, kind: i32, count_out: *mut usize) -> i32 {
    ffi_guard!({
        read(run, count_out, |sim| {
            let kind = decode(sim, LOADED, types::object_kind(kind))?;
            sim.object_count(kind)
        })
    })
}

// ── Gages ───────────────────────────────────────────────────────

/// Current precipitation of a gage; `kind` is a `SwalePrecipKind`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_precipitation(run: u64, gage: u32, kind: i32, rate_out: *mut f64) -> i32 {
    ffi_guard!({
        read(run, rate_out, |sim| {
            let kind = decode(sim, BEFORE_END, types::precip_kind(kind))?;
            sim.precipitation(gage, kind)
        })
    })
}

/// Override a gage's precipitation from now on.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_set_precipitation(run: u64, gage: u32, rate: f64) -> i32 {
    ffi_guard!({ status_of(with_run(run, |sim| sim.set_precipitation(gage, rate))) })
}

// ── RDII ────────────────────────────────────────────────────────

/// Copy the flattened RTK table of a unit hydrograph into `buf`, which
/// must hold at least `RTK_VALUES` (108) values.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_rdii_params(run: u64, unit_hyd: u32, buf: *mut f64, cap: usize) -> i32 {
    ffi_guard!({
        read_array(run, buf, cap, std::ptr::null_mut(), |sim| {
            Ok(sim.rdii_params(unit_hyd)?.to_flat())
        })
    })
}

/// Replace the RTK table of a unit hydrograph from `n` flattened values.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_set_rdii_params(run: u64, unit_hyd: u32, values: *const f64, n: usize) -> i32 {
    ffi_guard!({
        let values = match c_slice(values, n) {
            Ok(v) => v,
            Err(status) => return status as i32,
        };
        status_of(with_run(run, |sim| sim.set_rdii_params_flat(unit_hyd, values)))
    })
}

/// Number of values in a flattened RTK table.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_rtk_len() -> usize {
    RTK_VALUES
}

/// An RDII parameter of a node; `param` is a `SwaleNodeParam`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_node_param(run: u64, node: u32, param: i32, value_out: *mut f64) -> i32 {
    ffi_guard!({
        read(run, value_out, |sim| {
            let param = decode(sim, PRE_RUN, types::node_param(param))?;
            sim.node_param(node, param)
        })
    })
}

/// Set an RDII parameter of a node.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_set_node_param(run: u64, node: u32, param: i32, value: f64) -> i32 {
    ffi_guard!({
        status_of(with_run(run, |sim| {
            let param = decode(sim, PRE_RUN, types::node_param(param))?;
            sim.set_node_param(node, param, value)
        }))
    })
}

// ── Live results ────────────────────────────────────────────────

/// A hydrology result of a subcatchment (`SwaleSubcatchResult`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_subcatch_result(run: u64, index: u32, result: i32, value_out: *mut f64) -> i32 {
    ffi_guard!({
        read(run, value_out, |sim| {
            let result = decode(sim, RUNNING, types::subcatch_result(result))?;
            sim.subcatch_result(index, result)
        })
    })
}

/// A hydraulic result of a node (`SwaleNodeResult`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_node_result(run: u64, index: u32, result: i32, value_out: *mut f64) -> i32 {
    ffi_guard!({
        read(run, value_out, |sim| {
            let result = decode(sim, RUNNING, types::node_result(result))?;
            sim.node_result(index, result)
        })
    })
}

/// A hydraulic result of a link (`SwaleLinkResult`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_link_result(run: u64, index: u32, result: i32, value_out: *mut f64) -> i32 {
    ffi_guard!({
        read(run, value_out, |sim| {
            let result = decode(sim, RUNNING, types::link_result(result))?;
            sim.link_result(index, result)
        })
    })
}

// ── Pollutants ──────────────────────────────────────────────────

/// Per-pollutant values of a subcatchment (`SwaleSubcatchPollutant`).
///
/// `buf` must hold one value per pollutant; the count written goes to
/// `len_out` (which may be null).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_subcatch_pollut(
    run: u64,
    index: u32,
    property: i32,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        read_array(run, buf, cap, len_out, |sim| {
            let property = decode(sim, RUNNING, types::subcatch_pollutant(property))?;
            sim.subcatch_pollut(index, property)
        })
    })
}

/// Per-pollutant values of a node (`SwalePollutantProperty`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_node_pollut(
    run: u64,
    index: u32,
    property: i32,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        read_array(run, buf, cap, len_out, |sim| {
            let property = decode(sim, RUNNING, types::pollutant_property(property))?;
            sim.node_pollut(index, property)
        })
    })
}

/// Per-pollutant values of a link (`SwalePollutantProperty`).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_link_pollut(
    run: u64,
    index: u32,
    property: i32,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        read_array(run, buf, cap, len_out, |sim| {
            let property = decode(sim, RUNNING, types::pollutant_property(property))?;
            sim.link_pollut(index, property)
        })
    })
}

/// Force a node concentration; `mode` is a `SwaleOverrideMode`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_set_node_pollut(run: u64, node: u32, mode: i32, pollutant: u32, value: f64) -> i32 {
    ffi_guard!({
        status_of(with_run(run, |sim| {
            let mode = decode(sim, RUNNING, types::override_mode(mode))?;
            sim.set_node_pollut_with_mode(node, mode, pollutant, value)
        }))
    })
}

/// Force a link concentration; `mode` is a `SwaleOverrideMode`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_set_link_pollut(run: u64, link: u32, mode: i32, pollutant: u32, value: f64) -> i32 {
    ffi_guard!({
        status_of(with_run(run, |sim| {
            let mode = decode(sim, RUNNING, types::override_mode(mode))?;
            sim.set_link_pollut(link, mode, pollutant, value)
        }))
    })
}

/// Remove a node override.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_clear_node_pollut(run: u64, node: u32, pollutant: u32) -> i32 {
    ffi_guard!({ status_of(with_run(run, |sim| sim.clear_node_pollut(node, pollutant))) })
}

/// Remove a link override.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_clear_link_pollut(run: u64, link: u32, pollutant: u32) -> i32 {
    ffi_guard!({ status_of(with_run(run, |sim| sim.clear_link_pollut(link, pollutant))) })
}

// ── Statistics ──────────────────────────────────────────────────

/// Totals of a subcatchment; available once the run has ended.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_subcatch_stats(run: u64, index: u32, stats_out: *mut SwaleSubcatchStats) -> i32 {
    ffi_guard!({ read(run, stats_out, |sim| sim.subcatch_stats(index).map(Into::into)) })
}

/// Totals of a node.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_node_stats(run: u64, index: u32, stats_out: *mut SwaleNodeStats) -> i32 {
    ffi_guard!({ read(run, stats_out, |sim| sim.node_stats(index).map(Into::into)) })
}

/// Totals of a link.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_link_stats(run: u64, index: u32, stats_out: *mut SwaleLinkStats) -> i32 {
    ffi_guard!({ read(run, stats_out, |sim| sim.link_stats(index).map(Into::into)) })
}

/// Network volume balance.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_get_routing_totals(run: u64, totals_out: *mut SwaleRoutingTotals) -> i32 {
    ffi_guard!({ read(run, totals_out, |sim| sim.routing_totals().map(Into::into)) })
}
