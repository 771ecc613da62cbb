//! Project builder FFI: assemble a `Project` behind an opaque handle.
//!
//! C callers create a builder with the run options, add entities in index
//! order, then pass the handle to `swale_run_create`. Cross references
//! are entity indices; they are checked when the run is opened, not here.

use std::os::raw::c_char;
use std::sync::Mutex;

use swale_core::{
    DirectInflow, GageDef, GageId, LandPollutant, LinkDef, NodeDef, NodeId, PollutantDef,
    PollutantVec, PrecipSample, Project, RdiiInflow, RtkTable, SimOptions, StartDate, SubcatchDef,
    UnitHydDef, UnitHydId,
};

use crate::handle::{HandleKind, Handled, Registry};
use crate::status::SwaleStatus;
use crate::types;
use crate::{c_slice, c_str, status_of, write_out};

impl Handled for Project {
    const KIND: HandleKind = HandleKind::Project;
}

static PROJECTS: Mutex<Registry<Project>> = Mutex::new(Registry::new());

pub(crate) fn projects() -> &'static Mutex<Registry<Project>> {
    &PROJECTS
}

/// Apply `change` to the project behind `handle` and write the index it
/// returns to `out` (which may be null).
fn edit(
    handle: u64,
    out: *mut u32,
    change: impl FnOnce(&mut Project) -> Result<u32, SwaleStatus>,
) -> i32 {
    let mut table = ffi_lock!(PROJECTS);
    let project = match table.get_mut(handle) {
        Some(p) => p,
        None => return SwaleStatus::InvalidHandle as i32,
    };
    let index = match change(project) {
        Ok(i) => i,
        Err(status) => return status as i32,
    };
    if out.is_null() {
        return SwaleStatus::Ok as i32;
    }
    status_of(write_out(out, index))
}

fn entry<T>(items: &mut indexmap::IndexMap<String, T>, index: u32) -> Result<&mut T, SwaleStatus> {
    items
        .get_index_mut(index as usize)
        .map(|(_, v)| v)
        .ok_or(SwaleStatus::IndexOutOfRange)
}

// ── FFI functions ───────────────────────────────────────────────

/// Create an empty project. `units` is a `SwaleUnitSystem` value.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_create(
    year: i32,
    month: u32,
    day: u32,
    duration_secs: f64,
    step_secs: f64,
    units: i32,
    out: *mut u64,
) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return SwaleStatus::InvalidArgument as i32;
        }
        let units = match types::unit_system(units) {
            Ok(u) => u,
            Err(e) => return SwaleStatus::from(&e) as i32,
        };
        let project = Project::new(SimOptions {
            start: StartDate { year, month, day },
            duration_secs,
            step_secs,
            units,
        });
        match ffi_lock!(PROJECTS).insert(project) {
            Some(handle) => status_of(write_out(out, handle)),
            None => SwaleStatus::AllocationFailed as i32,
        }
    })
}

/// Destroy a project builder.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(PROJECTS).remove(handle) {
            Some(_) => SwaleStatus::Ok as i32,
            None => SwaleStatus::InvalidHandle as i32,
        }
    })
}

/// Add a gage with a recorded series of `n` samples.
///
/// `times` are seconds from the start, ascending; `snow` may be null.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_gage(
    handle: u64,
    id: *const c_char,
    times: *const f64,
    rain: *const f64,
    snow: *const f64,
    n: usize,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let parsed = (|| -> Result<(String, GageDef), SwaleStatus> {
            let id = c_str(id)?;
            let times = c_slice(times, n)?;
            let rain = c_slice(rain, n)?;
            let snow = if snow.is_null() { &[][..] } else { c_slice(snow, n)? };
            let series = times
                .iter()
                .zip(rain)
                .enumerate()
                .map(|(i, (&time_secs, &rain))| PrecipSample {
                    time_secs,
                    rain,
                    snow: snow.get(i).copied().unwrap_or(0.0),
                })
                .collect();
            Ok((id.to_owned(), GageDef { series }))
        })();
        let (id, def) = match parsed {
            Ok(p) => p,
            Err(status) => return status as i32,
        };
        edit(handle, index_out, |p| Ok(p.add_gage(id, def).0))
    })
}

/// Add a pollutant.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_pollutant(
    handle: u64,
    id: *const c_char,
    rain_conc: f64,
    decay: f64,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s.to_owned(),
            Err(status) => return status as i32,
        };
        edit(handle, index_out, |p| {
            Ok(p.add_pollutant(id, PollutantDef { rain_conc, decay }).0)
        })
    })
}

/// Add a unit hydrograph driven by gage `gage`.
///
/// `rtk` holds the flattened month-major table (`RTK_VALUES` values).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_unit_hydrograph(
    handle: u64,
    id: *const c_char,
    gage: u32,
    rtk: *const f64,
    n: usize,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s.to_owned(),
            Err(status) => return status as i32,
        };
        let values = match c_slice(rtk, n) {
            Ok(v) => v,
            Err(status) => return status as i32,
        };
        let rtk = match RtkTable::from_flat(values) {
            Ok(t) => t,
            Err(e) => return SwaleStatus::from(&e) as i32,
        };
        edit(handle, index_out, |p| {
            let def = UnitHydDef {
                gage: GageId(gage),
                rtk,
            };
            Ok(p.add_unit_hydrograph(id, def).0)
        })
    })
}

/// Add a node. `kind` is a `SwaleNodeKind`; `detention_hours` is used only
/// for storage units.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_node(
    handle: u64,
    id: *const c_char,
    kind: i32,
    detention_hours: f64,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s.to_owned(),
            Err(status) => return status as i32,
        };
        let kind = match types::node_kind(kind, detention_hours) {
            Ok(k) => k,
            Err(e) => return SwaleStatus::from(&e) as i32,
        };
        edit(handle, index_out, |p| {
            let def = NodeDef {
                kind,
                ..NodeDef::default()
            };
            Ok(p.add_node(id, def).0)
        })
    })
}

/// Assign RDII from unit hydrograph `unit_hyd` over `area` to a node.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_set_node_rdii(
    handle: u64,
    node: u32,
    unit_hyd: u32,
    area: f64,
) -> i32 {
    ffi_guard!({
        edit(handle, std::ptr::null_mut(), |p| {
            let def = entry(&mut p.nodes, node)?;
            def.rdii = Some(RdiiInflow {
                unit_hyd: UnitHydId(unit_hyd),
                area,
            });
            Ok(node)
        })
    })
}

/// Give a node a constant direct inflow carrying `n` pollutant
/// concentrations (in pollutant index order).
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_set_direct_inflow(
    handle: u64,
    node: u32,
    flow: f64,
    conc: *const f64,
    n: usize,
) -> i32 {
    ffi_guard!({
        let conc = match c_slice(conc, n) {
            Ok(c) => PollutantVec::from_slice(c),
            Err(status) => return status as i32,
        };
        edit(handle, std::ptr::null_mut(), |p| {
            let def = entry(&mut p.nodes, node)?;
            def.direct = Some(DirectInflow { flow, conc });
            Ok(node)
        })
    })
}

/// Add a subcatchment on gage `gage` draining to node `outlet`.
#[allow(clippy::too_many_arguments)]
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_subcatchment(
    handle: u64,
    id: *const c_char,
    gage: u32,
    outlet: u32,
    area: f64,
    depression_storage: f64,
    reservoir_coeff: f64,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s.to_owned(),
            Err(status) => return status as i32,
        };
        edit(handle, index_out, |p| {
            let def = SubcatchDef {
                gage: GageId(gage),
                outlet: NodeId(outlet),
                area,
                depression_storage,
                reservoir_coeff,
                pollutants: Vec::new(),
            };
            Ok(p.add_subcatchment(id, def).0)
        })
    })
}

/// Set buildup and washoff of one pollutant on a subcatchment.
#[allow(clippy::too_many_arguments)]
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_set_land_pollutant(
    handle: u64,
    subcatch: u32,
    pollutant: u32,
    buildup_max: f64,
    buildup_rate: f64,
    initial_buildup: f64,
    washoff_coeff: f64,
    washoff_exp: f64,
) -> i32 {
    ffi_guard!({
        edit(handle, std::ptr::null_mut(), |p| {
            if pollutant as usize >= p.pollutants.len() {
                return Err(SwaleStatus::IndexOutOfRange);
            }
            let def = entry(&mut p.subcatchments, subcatch)?;
            let k = pollutant as usize;
            if def.pollutants.len() <= k {
                def.pollutants.resize(k + 1, LandPollutant::default());
            }
            def.pollutants[k] = LandPollutant {
                buildup_max,
                buildup_rate,
                initial_buildup,
                washoff_coeff,
                washoff_exp,
            };
            Ok(subcatch)
        })
    })
}

/// Add a link from node `from` to node `to`.
#[allow(unsafe_code)]
#[no_mangle]
pub extern "C" fn swale_project_add_link(
    handle: u64,
    id: *const c_char,
    from: u32,
    to: u32,
    length: f64,
    velocity: f64,
    index_out: *mut u32,
) -> i32 {
    ffi_guard!({
        let id = match c_str(id) {
            Ok(s) => s.to_owned(),
            Err(status) => return status as i32,
        };
        edit(handle, index_out, |p| {
            let def = LinkDef {
                from: NodeId(from),
                to: NodeId(to),
                length,
                velocity,
            };
            Ok(p.add_link(id, def).0)
        })
    })
}
