//! Swale: an in-run kernel for urban drainage simulation.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Swale sub-crates. For most users, adding `swale` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use swale::prelude::*;
//!
//! let mut project = Project::new(SimOptions::default());
//! let gage = project.add_gage(
//!     "RG1",
//!     GageDef {
//!         series: vec![
//!             PrecipSample { time_secs: 0.0, rain: 0.5, snow: 0.0 },
//!             PrecipSample { time_secs: 3_600.0, rain: 0.0, snow: 0.0 },
//!         ],
//!     },
//! );
//! let j1 = project.add_node("J1", NodeDef::default());
//! let out = project.add_node(
//!     "OUT",
//!     NodeDef { kind: NodeKind::Outfall, ..NodeDef::default() },
//! );
//! project.add_subcatchment(
//!     "S1",
//!     SubcatchDef {
//!         gage,
//!         outlet: j1,
//!         area: 10.0,
//!         depression_storage: 0.05,
//!         reservoir_coeff: 1.5,
//!         pollutants: Vec::new(),
//!     },
//! );
//! project.add_link("C1", LinkDef { from: j1, to: out, length: 400.0, velocity: 2.0 });
//!
//! let mut sim = Simulation::with_reference_models(StaticLoader::new(project));
//! sim.open("site.inp", "site.rpt", "site.out")?;
//! sim.start(false)?;
//! while sim.step()? > 0.0 {}
//! sim.end()?;
//! assert!(sim.routing_totals()?.continuity_error().abs() < 1e-6);
//! sim.close()?;
//! # Ok::<(), ApiError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `swale-core` | IDs, selectors, project topology, RTK tables, errors, collaborator traits |
//! | [`rdii`] | `swale-rdii` | Rainfall history, RTK kernels, RDII generation, hydrograph tables |
//! | [`quality`] | `swale-quality` | Pollutant state, overrides and transport |
//! | [`models`] | `swale-models` | Reference runoff and routing models |
//! | [`engine`] | `swale-engine` | Lifecycle, gage feed, step engine, statistics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, selectors and traits (`swale-core`).
///
/// Contains the [`types::Project`] topology, [`types::RtkTable`], the shared
/// error types and the collaborator traits [`types::RunoffModel`] and
/// [`types::RoutingModel`].
pub use swale_core as types;

/// RDII generation (`swale-rdii`).
///
/// [`rdii::RdiiGenerator`] convolves per-gage rainfall history with each unit
/// hydrograph's kernels.
pub use swale_rdii as rdii;

/// Pollutant tracking (`swale-quality`).
pub use swale_quality as quality;

/// Reference collaborator models (`swale-models`).
pub use swale_models as models;

/// The run API (`swale-engine`).
///
/// [`engine::Simulation`] gates every operation on the run lifecycle.
pub use swale_engine as engine;

/// Common imports for typical Swale usage.
///
/// ```rust
/// use swale::prelude::*;
/// ```
pub mod prelude {
    // Project topology
    pub use swale_core::{
        DirectInflow, GageDef, LandPollutant, LinkDef, NodeDef, NodeKind, PollutantDef,
        PrecipSample, Project, RdiiInflow, SimOptions, StartDate, SubcatchDef, UnitHydDef,
        UnitSystem,
    };

    // Unit hydrographs
    pub use swale_core::{Rtk, RtkTable};

    // Selectors
    pub use swale_core::{
        LinkResult, NodeParam, NodeResult, ObjectKind, OverrideMode, PollutantProperty,
        PrecipKind, SubcatchPollutant, SubcatchResult,
    };

    // Errors
    pub use swale_core::{IndexError, LifecycleError, ParameterError, StepError};

    // Collaborators
    pub use swale_core::{ProjectLoader, RoutingModel, RunoffModel};

    // Engine
    pub use swale_engine::{
        ApiError, RunPhase, Simulation, StaticLoader, StepMetrics, TableLoader,
    };
}
