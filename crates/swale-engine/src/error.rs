//! The error type returned by every [`Simulation`](crate::Simulation) call.

use std::error::Error;
use std::fmt;

use swale_core::{IndexError, LifecycleError, LoadError, ParameterError, StepError};

use crate::config::ConfigError;

/// Failure of a run API call.
///
/// Checks run in a fixed order, so the variant tells which check failed
/// first: lifecycle, then index, then parameter values.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiError {
    /// Call not permitted in the current run phase.
    Lifecycle(LifecycleError),
    /// Index, id or selector out of range.
    Index(IndexError),
    /// Value rejected.
    Parameter(ParameterError),
    /// An output buffer could not be allocated.
    Allocation,
    /// The step failed and was not committed.
    Step(StepError),
    /// The project could not be loaded.
    Load(LoadError),
    /// The project failed validation.
    Config(ConfigError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Index(e) => write!(f, "index: {e}"),
            Self::Parameter(e) => write!(f, "parameter: {e}"),
            Self::Allocation => write!(f, "output allocation failed"),
            Self::Step(e) => write!(f, "step: {e}"),
            Self::Load(e) => write!(f, "load: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lifecycle(e) => Some(e),
            Self::Index(e) => Some(e),
            Self::Parameter(e) => Some(e),
            Self::Allocation => None,
            Self::Step(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

impl From<ParameterError> for ApiError {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

impl From<StepError> for ApiError {
    fn from(e: StepError) -> Self {
        Self::Step(e)
    }
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
