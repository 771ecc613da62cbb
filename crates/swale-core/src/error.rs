//! Error types shared across the Swale workspace.
//!
//! Organised by the check that produces them: lifecycle gating, index and
//! selector range checks, parameter value checks, collaborator (model)
//! failures, step execution and project loading. The umbrella type used by
//! the run API lives in `swale-engine`.

use std::error::Error;
use std::fmt;

use crate::id::NodeId;
use crate::kinds::ObjectKind;

// ── LifecycleError ─────────────────────────────────────────────

/// A call was made in a run phase that does not permit it.
///
/// Always reported before any index or value validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    /// No project is open.
    NotOpen,
    /// A project is already open.
    AlreadyOpen,
    /// The simulation is running.
    Running,
    /// The simulation is not running (never started, ended, or past its
    /// terminal step).
    NotRunning,
    /// The simulation has not ended, so final results are unavailable.
    NotEnded,
    /// The simulation has ended; pre-run edits are no longer possible.
    Ended,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "no project is open"),
            Self::AlreadyOpen => write!(f, "a project is already open"),
            Self::Running => write!(f, "simulation is running"),
            Self::NotRunning => write!(f, "simulation is not running"),
            Self::NotEnded => write!(f, "simulation has not ended"),
            Self::Ended => write!(f, "simulation has ended"),
        }
    }
}

impl Error for LifecycleError {}

// ── IndexError ─────────────────────────────────────────────────

/// An object index, id or selector value is out of range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// Index beyond the entity table.
    Object {
        /// Entity table addressed.
        kind: ObjectKind,
        /// The offending index.
        index: u32,
    },
    /// No entity with this id.
    UnknownId {
        /// Entity table searched.
        kind: ObjectKind,
        /// The id that was not found.
        id: String,
    },
    /// An integer selector (kind, parameter, property) is not recognised.
    Selector {
        /// What the selector selects.
        name: &'static str,
        /// The unrecognised value.
        value: i32,
    },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object { kind, index } => write!(f, "{kind} index {index} out of range"),
            Self::UnknownId { kind, id } => write!(f, "no {kind} named '{id}'"),
            Self::Selector { name, value } => write!(f, "unknown {name} selector {value}"),
        }
    }
}

impl Error for IndexError {}

// ── ParameterError ─────────────────────────────────────────────

/// A supplied value violates a parameter constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterError {
    /// An R, T or K value is negative or not finite.
    InvalidRtk {
        /// Month group (0 = January).
        month: usize,
        /// Response term (0 = short).
        term: usize,
    },
    /// The response ratios of a month group sum above 1.
    RatioSum {
        /// Month group (0 = January).
        month: usize,
        /// The offending sum.
        sum: f64,
    },
    /// A flattened RTK table has the wrong number of values.
    RtkLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// A scalar value is negative, non-finite or otherwise inadmissible.
    InvalidValue {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The node has no unit hydrograph, so it has no RDII area to edit.
    NoUnitHydrograph {
        /// The node addressed.
        node: NodeId,
    },
    /// A response term spans more steps than a kernel may hold.
    KernelTooLong {
        /// Month group (0 = January).
        month: usize,
        /// Response term (0 = short).
        term: usize,
        /// Largest permitted kernel, in steps.
        max: usize,
    },
}

impl ParameterError {
    /// Whether this is one of the RTK ratio/sign violations.
    pub fn is_ratio_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRtk { .. } | Self::RatioSum { .. } | Self::RtkLength { .. }
        )
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRtk { month, term } => {
                write!(f, "negative or non-finite RTK value (month {month}, term {term})")
            }
            Self::RatioSum { month, sum } => {
                write!(f, "response ratios of month {month} sum to {sum}, above 1")
            }
            Self::RtkLength { expected, actual } => {
                write!(f, "RTK table needs {expected} values, got {actual}")
            }
            Self::InvalidValue { name, value } => write!(f, "invalid {name}: {value}"),
            Self::NoUnitHydrograph { node } => {
                write!(f, "node {node} has no unit hydrograph")
            }
            Self::KernelTooLong { month, term, max } => write!(
                f,
                "response of month {month}, term {term} spans more than {max} steps"
            ),
        }
    }
}

impl Error for ParameterError {}

// ── ModelError ─────────────────────────────────────────────────

/// Failure reported by (or detected in the output of) a collaborator model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// The model's step failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A non-finite value appeared in the model's output.
    NonFinite {
        /// The quantity that went bad.
        quantity: &'static str,
        /// Entity index of the first bad value.
        index: usize,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::NonFinite { quantity, index } => {
                write!(f, "non-finite {quantity} at index {index}")
            }
        }
    }
}

impl Error for ModelError {}

// ── StepError ──────────────────────────────────────────────────

/// The stages of one simulation step, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Gage precipitation resolution.
    GageFeed,
    /// Non-RDII hydrology (runoff, buildup, washoff).
    Runoff,
    /// RDII convolution.
    Rdii,
    /// Network routing.
    Routing,
    /// Pollutant transport.
    Quality,
    /// Statistics accumulation.
    Statistics,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GageFeed => "gage feed",
            Self::Runoff => "runoff",
            Self::Rdii => "rdii",
            Self::Routing => "routing",
            Self::Quality => "quality",
            Self::Statistics => "statistics",
        };
        f.write_str(name)
    }
}

/// Errors from executing one step. The step is not committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
    /// A stage failed; later stages did not run.
    StageFailed {
        /// The failing stage.
        stage: Stage,
        /// Name of the model executing the stage.
        model: String,
        /// The underlying failure.
        reason: ModelError,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StageFailed {
                stage,
                model,
                reason,
            } => write!(f, "{stage} stage ({model}) failed: {reason}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StageFailed { reason, .. } => Some(reason),
        }
    }
}

// ── LoadError ──────────────────────────────────────────────────

/// Errors obtaining a project from its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The input could not be read.
    Io {
        /// Input path.
        path: String,
        /// Underlying I/O message.
        reason: String,
    },
    /// The input is malformed.
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// The loader refused the input for another reason.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "cannot read '{path}': {reason}"),
            Self::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            Self::Rejected { reason } => write!(f, "input rejected: {reason}"),
        }
    }
}

impl Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_exposes_model_source() {
        let e = StepError::StageFailed {
            stage: Stage::Routing,
            model: "steady".into(),
            reason: ModelError::ExecutionFailed {
                reason: "boom".into(),
            },
        };
        assert!(e.source().is_some());
        assert_eq!(
            e.to_string(),
            "routing stage (steady) failed: execution failed: boom"
        );
    }

    #[test]
    fn ratio_violations_are_classified() {
        assert!(ParameterError::RatioSum { month: 0, sum: 1.5 }.is_ratio_violation());
        assert!(ParameterError::InvalidRtk { month: 2, term: 1 }.is_ratio_violation());
        assert!(!ParameterError::InvalidValue {
            name: "area",
            value: -1.0
        }
        .is_ratio_violation());
        let long = ParameterError::KernelTooLong {
            month: 3,
            term: 2,
            max: 10,
        };
        assert!(!long.is_ratio_violation());
        assert_eq!(
            long.to_string(),
            "response of month 3, term 2 spans more than 10 steps"
        );
    }
}
