//! Strongly-typed entity indices.
//!
//! Every entity table in a [`Project`](crate::Project) is insertion ordered,
//! so `NodeId(n)` is the n-th node of the project. IDs are plain indices and
//! carry no run identity; validating them against a run is the caller's job.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// The index as a `usize`, for slicing entity tables.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

entity_id!(
    /// Identifies a rain gage.
    GageId
);
entity_id!(
    /// Identifies a subcatchment.
    SubcatchId
);
entity_id!(
    /// Identifies a conveyance node (junction, outfall or storage unit).
    NodeId
);
entity_id!(
    /// Identifies a conveyance link.
    LinkId
);
entity_id!(
    /// Identifies a tracked pollutant.
    PollutantId
);
entity_id!(
    /// Identifies a unit hydrograph (an RTK parameter table).
    UnitHydId
);
