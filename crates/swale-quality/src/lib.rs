//! Pollutant transport and load tracking.
//!
//! [`QualityState`] holds concentrations, cumulative loads and external
//! overrides for every subcatchment, node and link. [`PollutantTracker`]
//! advances it one step at a time from the hydrology and hydraulics the
//! engine staged for that step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod state;
pub mod tracker;

pub use state::{ConveyanceQuality, Override, OverrideVec, QualityState, SubcatchQuality};
pub use tracker::{PollutantTracker, TransportInputs};
