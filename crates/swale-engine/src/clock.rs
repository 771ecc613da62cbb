//! Simulation clock: step count, elapsed time and calendar month.

use jiff::civil::{Date, DateTime, Time};
use jiff::SignedDuration;
use swale_core::SimOptions;

use crate::config::ConfigError;

/// Maps step counts to elapsed seconds and calendar dates.
///
/// Elapsed time is always `steps × step`, clamped to the duration, so it
/// never accumulates rounding drift.
#[derive(Clone, Debug)]
pub struct SimClock {
    start: DateTime,
    step_secs: f64,
    duration_secs: f64,
    total_steps: u64,
}

impl SimClock {
    /// Build from run options.
    ///
    /// Step and duration are assumed positive; only the date is checked.
    pub fn new(options: &SimOptions) -> Result<Self, ConfigError> {
        let s = options.start;
        let invalid = || ConfigError::InvalidStartDate {
            year: s.year,
            month: s.month,
            day: s.day,
        };
        let year = i16::try_from(s.year).map_err(|_| invalid())?;
        let month = i8::try_from(s.month).map_err(|_| invalid())?;
        let day = i8::try_from(s.day).map_err(|_| invalid())?;
        let date = Date::new(year, month, day).map_err(|_| invalid())?;
        // A partial last step still counts as a step.
        let total_steps = (options.duration_secs / options.step_secs - 1e-9).ceil().max(1.0) as u64;
        Ok(Self {
            start: date.to_datetime(Time::midnight()),
            step_secs: options.step_secs,
            duration_secs: options.duration_secs,
            total_steps,
        })
    }

    /// Number of steps in the run.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Elapsed seconds after `steps` steps.
    pub fn elapsed_secs(&self, steps: u64) -> f64 {
        (steps as f64 * self.step_secs).min(self.duration_secs)
    }

    /// Length of step number `index` (0-based); the last may be short.
    pub fn step_length(&self, index: u64) -> f64 {
        self.elapsed_secs(index + 1) - self.elapsed_secs(index)
    }

    /// Date and time `elapsed_secs` after the start.
    pub fn datetime_at(&self, elapsed_secs: f64) -> Option<DateTime> {
        let offset = SignedDuration::from_secs(elapsed_secs.floor() as i64);
        self.start.checked_add(offset).ok()
    }

    /// Calendar month (0 = January) at `elapsed_secs`.
    pub fn month_index(&self, elapsed_secs: f64) -> usize {
        let dt = self.datetime_at(elapsed_secs).unwrap_or(self.start);
        (dt.month() - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swale_core::StartDate;

    fn clock(month: u32, day: u32, duration: f64, step: f64) -> SimClock {
        SimClock::new(&SimOptions {
            start: StartDate {
                year: 2024,
                month,
                day,
            },
            duration_secs: duration,
            step_secs: step,
            ..SimOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn whole_steps() {
        let c = clock(1, 1, 86_400.0, 60.0);
        assert_eq!(c.total_steps(), 1_440);
        assert_eq!(c.elapsed_secs(1_440), 86_400.0);
    }

    #[test]
    fn partial_last_step() {
        let c = clock(1, 1, 150.0, 60.0);
        assert_eq!(c.total_steps(), 3);
        assert_eq!(c.step_length(2), 30.0);
        assert_eq!(c.elapsed_secs(9), 150.0);
    }

    #[test]
    fn month_rolls_over_leap_february() {
        let c = clock(2, 28, 10.0 * 86_400.0, 3_600.0);
        assert_eq!(c.month_index(0.0), 1);
        // 2024-02-29 still February.
        assert_eq!(c.month_index(86_400.0), 1);
        assert_eq!(c.month_index(2.0 * 86_400.0), 2);
    }

    #[test]
    fn impossible_date_rejected() {
        let result = SimClock::new(&SimOptions {
            start: StartDate {
                year: 2023,
                month: 13,
                day: 1,
            },
            ..SimOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidStartDate { .. })));
    }
}
