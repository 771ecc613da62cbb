//! Triangular unit-hydrograph kernels.
//!
//! A response term is a triangle of unit area rising over `T` hours and
//! receding over `K·T` hours. Step weights are the exact area of the
//! triangle over each step interval, so the weights of one term always sum
//! to one and steady rainfall converges to `R · rainfall`.
//!
//! A run whose duration is not a whole number of steps ends on a shorter
//! step. Its weights ([`short_step_weights`]) give the mean response rate
//! over that shorter interval instead.

use swale_core::{ParameterError, Rtk, RtkTable, MAX_KERNEL_STEPS, MONTH_GROUPS, RESPONSE_TERMS};

/// Cumulative area of the unit triangle up to `t` hours.
pub fn cumulative_area(rtk: &Rtk, t: f64) -> f64 {
    let peak = rtk.t;
    let base = rtk.base_time();
    if t <= 0.0 {
        0.0
    } else if t >= base {
        1.0
    } else if t <= peak {
        t * t / (peak * base)
    } else {
        let rest = base - t;
        1.0 - rest * rest / ((base - peak) * base)
    }
}

/// Per-step weights of one term, lag 0 first.
///
/// Terms with `R = 0` have no weights. A zero time to peak responds
/// entirely within the current step. Returns `None` when the kernel would
/// exceed [`MAX_KERNEL_STEPS`].
pub fn step_weights(rtk: &Rtk, step_secs: f64) -> Option<Vec<f64>> {
    let steps = rtk.kernel_steps(step_secs)?;
    if rtk.r <= 0.0 {
        return Some(Vec::new());
    }
    if rtk.t <= 0.0 {
        return Some(vec![1.0]);
    }
    let dt_hours = step_secs / 3_600.0;
    let weights = (0..steps)
        .map(|j| {
            cumulative_area(rtk, (j + 1) as f64 * dt_hours) - cumulative_area(rtk, j as f64 * dt_hours)
        })
        .collect();
    Some(weights)
}

/// Weights of one term for a final step of `dt_secs`, shorter than the
/// kernel step `step_secs`.
///
/// Rain at lag 0 falls over `dt_secs` only; earlier samples fell over full
/// steps. Each weight is the response volume landing inside the short
/// interval divided by its length, so `dt_secs == step_secs` reproduces
/// [`step_weights`].
pub fn short_step_weights(rtk: &Rtk, step_secs: f64, dt_secs: f64) -> Option<Vec<f64>> {
    let steps = rtk.kernel_steps(step_secs)?;
    if rtk.r <= 0.0 {
        return Some(Vec::new());
    }
    if rtk.t <= 0.0 {
        return Some(vec![1.0]);
    }
    let step_hours = step_secs / 3_600.0;
    let dt_hours = dt_secs / 3_600.0;
    let weights = (0..steps)
        .map(|j| {
            if j == 0 {
                cumulative_area(rtk, dt_hours)
            } else {
                let start = j as f64 * step_hours;
                (cumulative_area(rtk, start + dt_hours) - cumulative_area(rtk, start)) * step_hours
                    / dt_hours
            }
        })
        .collect();
    Some(weights)
}

/// Step weights for every month group and term of a table.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelSet {
    ratios: [[f64; RESPONSE_TERMS]; MONTH_GROUPS],
    weights: Vec<Vec<f64>>,
}

impl KernelSet {
    /// Precompute the weights of `table` for a step of `step_secs`.
    ///
    /// Fails on the first term whose kernel exceeds [`MAX_KERNEL_STEPS`].
    pub fn new(table: &RtkTable, step_secs: f64) -> Result<Self, ParameterError> {
        Self::build(table, |rtk| step_weights(rtk, step_secs))
    }

    /// Weights for a final step of `dt_secs` on a run stepping `step_secs`.
    pub fn short_step(table: &RtkTable, step_secs: f64, dt_secs: f64) -> Result<Self, ParameterError> {
        Self::build(table, |rtk| short_step_weights(rtk, step_secs, dt_secs))
    }

    fn build(
        table: &RtkTable,
        kernel_of: impl Fn(&Rtk) -> Option<Vec<f64>>,
    ) -> Result<Self, ParameterError> {
        let mut ratios = [[0.0; RESPONSE_TERMS]; MONTH_GROUPS];
        let mut weights = Vec::with_capacity(MONTH_GROUPS * RESPONSE_TERMS);
        for (month, month_ratios) in ratios.iter_mut().enumerate() {
            for (term, rtk) in table.group(month).iter().enumerate() {
                month_ratios[term] = rtk.r;
                let kernel = kernel_of(rtk).ok_or(ParameterError::KernelTooLong {
                    month,
                    term,
                    max: MAX_KERNEL_STEPS,
                })?;
                weights.push(kernel);
            }
        }
        Ok(Self { ratios, weights })
    }

    /// Longest kernel over all groups and terms, in steps.
    pub fn window(&self) -> usize {
        self.weights.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Ratio of one term.
    pub fn ratio(&self, month: usize, term: usize) -> f64 {
        self.ratios[month % MONTH_GROUPS][term]
    }

    /// Weights of one term.
    pub fn weights(&self, month: usize, term: usize) -> &[f64] {
        &self.weights[(month % MONTH_GROUPS) * RESPONSE_TERMS + term]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cumulative_area_is_continuous_at_peak() {
        let rtk = Rtk::new(0.1, 2.0, 3.0);
        let left = cumulative_area(&rtk, 2.0 - 1e-9);
        let right = cumulative_area(&rtk, 2.0 + 1e-9);
        assert!((left - right).abs() < 1e-6);
        assert!((cumulative_area(&rtk, 2.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_ratio_has_no_kernel() {
        assert_eq!(step_weights(&Rtk::new(0.0, 2.0, 2.0), 60.0), Some(Vec::new()));
    }

    #[test]
    fn zero_peak_time_is_instantaneous() {
        assert_eq!(step_weights(&Rtk::new(0.2, 0.0, 2.0), 60.0), Some(vec![1.0]));
    }

    #[test]
    fn kernel_length_covers_base_time() {
        // Base 3 h at 15-minute steps.
        let w = step_weights(&Rtk::new(0.1, 1.0, 2.0), 900.0).unwrap();
        assert_eq!(w.len(), 12);
    }

    #[test]
    fn short_step_weights_match_full_step() {
        let rtk = Rtk::new(0.1, 2.0, 3.0);
        let full = step_weights(&rtk, 1_800.0).unwrap();
        let short = short_step_weights(&rtk, 1_800.0, 1_800.0).unwrap();
        assert_eq!(full.len(), short.len());
        for (a, b) in full.iter().zip(&short) {
            assert!((a - b).abs() < 1e-12, "{full:?} vs {short:?}");
        }
    }

    #[test]
    fn half_step_weights_are_mean_rates() {
        // Base 4 h, hourly kernel, final step of 30 minutes.
        let rtk = Rtk::new(1.0, 2.0, 1.0);
        let w = short_step_weights(&rtk, 3_600.0, 1_800.0).unwrap();
        assert_eq!(w.len(), 4);
        // Rain of the current half hour: area up to 0.5 h.
        assert!((w[0] - 0.25 / 8.0).abs() < 1e-12);
        // Rain one step back: area over [1, 1.5] h per half hour, per hour of rain.
        let area = cumulative_area(&rtk, 1.5) - cumulative_area(&rtk, 1.0);
        assert!((w[1] - 2.0 * area).abs() < 1e-12);
        assert!(w[0] < step_weights(&rtk, 3_600.0).unwrap()[0]);
    }

    #[test]
    fn oversized_kernel_is_refused() {
        assert_eq!(step_weights(&Rtk::new(0.1, 1e300, 1.0), 60.0), None);
        assert_eq!(step_weights(&Rtk::new(0.1, f64::MAX, f64::MAX), 1.0), None);
        assert_eq!(short_step_weights(&Rtk::new(0.1, 1e300, 1.0), 60.0, 30.0), None);
    }

    #[test]
    fn kernel_set_reports_oversized_term() {
        let mut table = RtkTable::default();
        table.set(9, 2, Rtk::new(0.2, 1e12, 0.0));
        match KernelSet::new(&table, 300.0) {
            Err(ParameterError::KernelTooLong {
                month: 9,
                term: 2,
                max,
            }) => assert_eq!(max, MAX_KERNEL_STEPS),
            other => panic!("expected KernelTooLong, got {other:?}"),
        }
    }

    #[test]
    fn kernel_set_window_is_longest_term() {
        let table = RtkTable::uniform([
            Rtk::new(0.1, 1.0, 1.0),
            Rtk::new(0.1, 2.0, 2.0),
            Rtk::new(0.0, 50.0, 50.0),
        ]);
        let set = KernelSet::new(&table, 3_600.0).unwrap();
        assert_eq!(set.window(), 6);
        assert_eq!(set.ratio(7, 1), 0.1);
        assert!(set.weights(7, 2).is_empty());
    }

    proptest! {
        #[test]
        fn weights_sum_to_one(t in 0.05f64..24.0, k in 0.0f64..6.0, step in 60.0f64..7_200.0) {
            let w = step_weights(&Rtk::new(0.3, t, k), step).unwrap();
            let sum: f64 = w.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
            prop_assert!(w.iter().all(|&x| x >= -1e-15));
        }
    }
}
