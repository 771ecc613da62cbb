//! Core types and traits for the Swale drainage simulation kernel.
//!
//! This is the leaf crate of the workspace. It defines entity IDs and
//! selectors, the shared error types, the static [`Project`] topology with
//! its RTK unit-hydrograph tables, the state records exchanged with
//! collaborator models, and the collaborator traits themselves.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod kinds;
pub mod project;
pub mod rtk;
pub mod state;
pub mod traits;
pub mod units;

pub use error::{
    IndexError, LifecycleError, LoadError, ModelError, ParameterError, Stage, StepError,
};
pub use id::{GageId, LinkId, NodeId, PollutantId, SubcatchId, UnitHydId};
pub use kinds::{
    LinkResult, NodeParam, NodeResult, ObjectKind, OverrideMode, PollutantProperty, PrecipKind,
    SubcatchPollutant, SubcatchResult,
};
pub use project::{
    DirectInflow, GageDef, LandPollutant, LinkDef, NodeDef, NodeKind, PollutantDef,
    PrecipSample, Project, RdiiInflow, SimOptions, StartDate, SubcatchDef, UnitHydDef,
};
pub use rtk::{
    Rtk, RtkTable, MAX_KERNEL_STEPS, MONTH_GROUPS, RATIO_SUM_TOLERANCE, RESPONSE_TERMS, RTK_VALUES,
};
pub use state::{LinkHydraulics, NodeHydraulics, PollutantVec, SurfaceState};
pub use traits::{ProjectLoader, RoutingContext, RoutingModel, RunoffContext, RunoffModel};
pub use units::UnitSystem;
