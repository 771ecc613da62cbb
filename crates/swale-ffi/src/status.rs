//! C-compatible status codes.
//!
//! [`SwaleStatus`] is a `repr(i32)` enum covering every error condition of
//! the run API. Codes are grouped by kind (lifecycle, index, parameter,
//! allocation, step) and never reused.

use swale_core::{IndexError, LifecycleError, ParameterError, StepError};
use swale_engine::ApiError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwaleStatus {
    /// Success.
    Ok = 0,
    /// No project is open.
    NotOpen = -1,
    /// A project is already open.
    AlreadyOpen = -2,
    /// Not permitted while the run is stepping.
    Running = -3,
    /// The run is not stepping.
    NotRunning = -4,
    /// Statistics requested before the run ended.
    NotEnded = -5,
    /// Pre-run edit after the run ended.
    Ended = -6,
    /// Object index out of range.
    IndexOutOfRange = -10,
    /// No object with the given id.
    UnknownId = -11,
    /// Kind, property or parameter selector not recognised.
    InvalidSelector = -12,
    /// RTK ratio or sign constraint violated.
    RatioViolation = -20,
    /// A value is negative, non-finite or otherwise inadmissible.
    InvalidValue = -21,
    /// An output could not be allocated.
    AllocationFailed = -30,
    /// A step stage failed; the step was not committed.
    StageFailed = -40,
    /// The project input could not be loaded.
    LoadFailed = -41,
    /// The project failed validation.
    ConfigError = -42,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -50,
    /// A pointer argument is null or a string is not UTF-8.
    InvalidArgument = -51,
    /// Caller-provided buffer is too small.
    BufferTooSmall = -52,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -53,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&LifecycleError> for SwaleStatus {
    fn from(e: &LifecycleError) -> Self {
        match e {
            LifecycleError::NotOpen => SwaleStatus::NotOpen,
            LifecycleError::AlreadyOpen => SwaleStatus::AlreadyOpen,
            LifecycleError::Running => SwaleStatus::Running,
            LifecycleError::NotRunning => SwaleStatus::NotRunning,
            LifecycleError::NotEnded => SwaleStatus::NotEnded,
            LifecycleError::Ended => SwaleStatus::Ended,
        }
    }
}

impl From<&IndexError> for SwaleStatus {
    fn from(e: &IndexError) -> Self {
        match e {
            IndexError::Object { .. } => SwaleStatus::IndexOutOfRange,
            IndexError::UnknownId { .. } => SwaleStatus::UnknownId,
            IndexError::Selector { .. } => SwaleStatus::InvalidSelector,
        }
    }
}

impl From<&ParameterError> for SwaleStatus {
    fn from(e: &ParameterError) -> Self {
        if e.is_ratio_violation() {
            SwaleStatus::RatioViolation
        } else {
            SwaleStatus::InvalidValue
        }
    }
}

impl From<&StepError> for SwaleStatus {
    fn from(e: &StepError) -> Self {
        match e {
            StepError::StageFailed { .. } => SwaleStatus::StageFailed,
        }
    }
}

impl From<&ApiError> for SwaleStatus {
    fn from(e: &ApiError) -> Self {
        match e {
            ApiError::Lifecycle(e) => e.into(),
            ApiError::Index(e) => e.into(),
            ApiError::Parameter(e) => e.into(),
            ApiError::Allocation => SwaleStatus::AllocationFailed,
            ApiError::Step(e) => e.into(),
            ApiError::Load(_) => SwaleStatus::LoadFailed,
            ApiError::Config(_) => SwaleStatus::ConfigError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swale_core::{ModelError, NodeId, ObjectKind, Stage};

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(SwaleStatus::Ok as i32, 0);
        assert_eq!(SwaleStatus::NotOpen as i32, -1);
        assert_eq!(SwaleStatus::AlreadyOpen as i32, -2);
        assert_eq!(SwaleStatus::Running as i32, -3);
        assert_eq!(SwaleStatus::NotRunning as i32, -4);
        assert_eq!(SwaleStatus::NotEnded as i32, -5);
        assert_eq!(SwaleStatus::Ended as i32, -6);
        assert_eq!(SwaleStatus::IndexOutOfRange as i32, -10);
        assert_eq!(SwaleStatus::UnknownId as i32, -11);
        assert_eq!(SwaleStatus::InvalidSelector as i32, -12);
        assert_eq!(SwaleStatus::RatioViolation as i32, -20);
        assert_eq!(SwaleStatus::InvalidValue as i32, -21);
        assert_eq!(SwaleStatus::AllocationFailed as i32, -30);
        assert_eq!(SwaleStatus::StageFailed as i32, -40);
        assert_eq!(SwaleStatus::LoadFailed as i32, -41);
        assert_eq!(SwaleStatus::ConfigError as i32, -42);
        assert_eq!(SwaleStatus::InvalidHandle as i32, -50);
        assert_eq!(SwaleStatus::InvalidArgument as i32, -51);
        assert_eq!(SwaleStatus::BufferTooSmall as i32, -52);
        assert_eq!(SwaleStatus::InternalError as i32, -53);
        assert_eq!(SwaleStatus::Panicked as i32, -128);
    }

    #[test]
    fn api_errors_map_by_kind() {
        let cases = [
            (ApiError::Lifecycle(LifecycleError::Running), SwaleStatus::Running),
            (
                ApiError::Index(IndexError::Object {
                    kind: ObjectKind::Node,
                    index: 9,
                }),
                SwaleStatus::IndexOutOfRange,
            ),
            (
                ApiError::Index(IndexError::Selector {
                    name: "precipitation kind",
                    value: 7,
                }),
                SwaleStatus::InvalidSelector,
            ),
            (
                ApiError::Parameter(ParameterError::RatioSum { month: 2, sum: 1.2 }),
                SwaleStatus::RatioViolation,
            ),
            (
                ApiError::Parameter(ParameterError::NoUnitHydrograph { node: NodeId(1) }),
                SwaleStatus::InvalidValue,
            ),
            (ApiError::Allocation, SwaleStatus::AllocationFailed),
            (
                ApiError::Step(StepError::StageFailed {
                    stage: Stage::Routing,
                    model: "steady_flow".into(),
                    reason: ModelError::ExecutionFailed {
                        reason: "diverged".into(),
                    },
                }),
                SwaleStatus::StageFailed,
            ),
        ];
        for (err, status) in &cases {
            assert_eq!(SwaleStatus::from(err), *status, "{err}");
        }
    }
}
