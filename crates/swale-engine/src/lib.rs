//! Run engine of the Swale drainage kernel.
//!
//! Provides [`Simulation`], the stateful run API: lifecycle gating, the gage
//! feed, a fixed-order step engine with all-or-nothing commits, live result
//! and pollutant access, and statistics frozen at the end of a run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod gage;
pub mod lifecycle;
pub mod loader;
pub mod metrics;
pub mod simulation;
pub mod state;
pub mod stats;
pub mod tick;

pub use clock::SimClock;
pub use config::{validate, ConfigError};
pub use error::ApiError;
pub use gage::{GageFeed, GageReading};
pub use lifecycle::{Lifecycle, RunPhase};
pub use loader::{StaticLoader, TableLoader};
pub use metrics::StepMetrics;
pub use simulation::{RunPaths, Simulation};
pub use state::NetworkState;
pub use stats::{LinkStats, NodeStats, RoutingTotals, RunStatistics, SubcatchStats};
pub use tick::StepEngine;
