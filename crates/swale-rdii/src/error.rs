//! Errors raised while building RDII kernels.

use std::error::Error;
use std::fmt;

use swale_core::{ParameterError, UnitHydId};

/// A unit hydrograph cannot be turned into step kernels.
#[derive(Clone, Debug, PartialEq)]
pub enum RdiiError {
    /// One of its response terms has no usable kernel at the run's step.
    Kernel {
        /// The unit hydrograph.
        unit_hyd: UnitHydId,
        /// The offending term.
        reason: ParameterError,
    },
}

impl fmt::Display for RdiiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel { unit_hyd, reason } => {
                write!(f, "unit hydrograph {unit_hyd}: {reason}")
            }
        }
    }
}

impl Error for RdiiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kernel { reason, .. } => Some(reason),
        }
    }
}
