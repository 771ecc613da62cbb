//! RTK unit-hydrograph parameter tables.
//!
//! A table holds three response terms (short, medium, long) for each of the
//! twelve calendar months. Construction does not validate: callers that
//! accept tables from outside check the target index first and then call
//! [`RtkTable::validate`], so range errors are reported before ratio errors.

use crate::error::ParameterError;

/// Number of response terms per month group.
pub const RESPONSE_TERMS: usize = 3;

/// Number of month groups.
pub const MONTH_GROUPS: usize = 12;

/// Length of a flattened table: months × terms × (R, T, K).
pub const RTK_VALUES: usize = MONTH_GROUPS * RESPONSE_TERMS * 3;

/// Slack on the per-month ratio sum, so ratios entered as decimals that
/// add up to exactly 1 are not rejected for binary rounding.
pub const RATIO_SUM_TOLERANCE: f64 = 1e-9;

/// Longest kernel a response term may have, in steps.
///
/// A term whose base `T·(1 + K)` spans more steps than this at the run's
/// step length is rejected. One million steps is almost 12 days of
/// one-second steps, or about 1 900 years of one-minute steps.
pub const MAX_KERNEL_STEPS: usize = 1_000_000;

/// One triangular response term.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rtk {
    /// Fraction of rainfall entering the sewer through this response.
    pub r: f64,
    /// Time to peak, hours.
    pub t: f64,
    /// Ratio of recession time to time to peak.
    pub k: f64,
}

impl Rtk {
    /// Construct a term.
    pub const fn new(r: f64, t: f64, k: f64) -> Self {
        Self { r, t, k }
    }

    /// Base of the triangle, `T·(1 + K)`, in hours.
    pub fn base_time(&self) -> f64 {
        self.t * (1.0 + self.k)
    }

    /// Kernel length at `step_secs`, or `None` beyond [`MAX_KERNEL_STEPS`].
    ///
    /// A zero ratio has no kernel; a zero time to peak takes one step.
    pub fn kernel_steps(&self, step_secs: f64) -> Option<usize> {
        if self.r <= 0.0 {
            return Some(0);
        }
        if self.t <= 0.0 {
            return Some(1);
        }
        let steps = (self.base_time() * 3_600.0 / step_secs).ceil().max(1.0);
        if steps.is_finite() && steps <= MAX_KERNEL_STEPS as f64 {
            Some(steps as usize)
        } else {
            None
        }
    }

    fn is_admissible(&self) -> bool {
        [self.r, self.t, self.k]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Full RTK table of one unit hydrograph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RtkTable {
    groups: [[Rtk; RESPONSE_TERMS]; MONTH_GROUPS],
}

impl RtkTable {
    /// Build from explicit month groups.
    pub fn from_groups(groups: [[Rtk; RESPONSE_TERMS]; MONTH_GROUPS]) -> Self {
        Self { groups }
    }

    /// The same three terms in every month.
    pub fn uniform(terms: [Rtk; RESPONSE_TERMS]) -> Self {
        Self {
            groups: [terms; MONTH_GROUPS],
        }
    }

    /// Rebuild from the flattened layout produced by [`to_flat`](Self::to_flat).
    ///
    /// Only the length is checked here.
    pub fn from_flat(values: &[f64]) -> Result<Self, ParameterError> {
        if values.len() != RTK_VALUES {
            return Err(ParameterError::RtkLength {
                expected: RTK_VALUES,
                actual: values.len(),
            });
        }
        let mut table = Self::default();
        for (i, triple) in values.chunks_exact(3).enumerate() {
            table.groups[i / RESPONSE_TERMS][i % RESPONSE_TERMS] =
                Rtk::new(triple[0], triple[1], triple[2]);
        }
        Ok(table)
    }

    /// Flatten month-major, then term, then (R, T, K).
    pub fn to_flat(&self) -> Vec<f64> {
        self.groups
            .iter()
            .flatten()
            .flat_map(|rtk| [rtk.r, rtk.t, rtk.k])
            .collect()
    }

    /// Terms of a month group (0 = January).
    pub fn group(&self, month: usize) -> &[Rtk; RESPONSE_TERMS] {
        &self.groups[month % MONTH_GROUPS]
    }

    /// Replace one term of one month group.
    pub fn set(&mut self, month: usize, term: usize, rtk: Rtk) {
        self.groups[month % MONTH_GROUPS][term % RESPONSE_TERMS] = rtk;
    }

    /// Check signs first, then the per-month ratio sums.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (month, terms) in self.groups.iter().enumerate() {
            for (term, rtk) in terms.iter().enumerate() {
                if !rtk.is_admissible() {
                    return Err(ParameterError::InvalidRtk { month, term });
                }
            }
        }
        for (month, terms) in self.groups.iter().enumerate() {
            let sum: f64 = terms.iter().map(|rtk| rtk.r).sum();
            if sum > 1.0 + RATIO_SUM_TOLERANCE {
                return Err(ParameterError::RatioSum { month, sum });
            }
        }
        Ok(())
    }

    /// Check that every kernel fits [`MAX_KERNEL_STEPS`] at `step_secs`.
    ///
    /// Assumes [`validate`](Self::validate) passed.
    pub fn check_window(&self, step_secs: f64) -> Result<(), ParameterError> {
        for (month, terms) in self.groups.iter().enumerate() {
            for (term, rtk) in terms.iter().enumerate() {
                if rtk.kernel_steps(step_secs).is_none() {
                    return Err(ParameterError::KernelTooLong {
                        month,
                        term,
                        max: MAX_KERNEL_STEPS,
                    });
                }
            }
        }
        Ok(())
    }
}
