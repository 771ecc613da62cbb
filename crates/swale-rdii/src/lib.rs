//! Rainfall-derived infiltration and inflow (RDII) generation.
//!
//! Each unit hydrograph keeps a bounded history of its gage's rainfall and
//! convolves it with triangular response kernels ([`kernel`]) built from
//! its RTK table. Nodes assigned to the hydrograph receive the response
//! scaled by their sewershed area ([`generator`]). Tables can be read from
//! `[HYDROGRAPHS]` text ([`table`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod history;
pub mod kernel;
pub mod table;

pub use error::RdiiError;
pub use generator::{RdiiGenerator, RdiiState};
pub use history::RainHistory;
pub use kernel::KernelSet;
pub use table::{merge_into, parse_hydrographs, read_hydrographs, InitialAbstraction, ParsedHydrograph};
