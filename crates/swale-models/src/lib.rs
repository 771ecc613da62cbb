//! Reference collaborator models for the Swale kernel.
//!
//! These make a run executable end to end without an external hydrology
//! package:
//!
//! 1. [`LinearReservoirRunoff`]: precipitation → ponded depth → runoff,
//!    with exponential buildup and power-law washoff.
//! 2. [`SteadyFlowRouting`]: lateral inflow routed node by node in
//!    upstream-to-downstream order.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod reservoir;
pub mod steady;

pub use reservoir::LinearReservoirRunoff;
pub use steady::SteadyFlowRouting;
