//! Fixed-capacity rainfall history.
//!
//! [`RainHistory`] keeps the most recent `capacity` samples of one unit
//! hydrograph's rainfall. The write position increases monotonically and the
//! slot of position `p` is `p % capacity`, so a push is O(1) and never
//! reallocates.

/// Sliding window over past rainfall samples.
#[derive(Clone, Debug, PartialEq)]
pub struct RainHistory {
    samples: Vec<f64>,
    write_pos: u64,
}

impl RainHistory {
    /// An empty history holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        (self.write_pos as usize).min(self.capacity())
    }

    /// Whether nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.write_pos == 0
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: f64) {
        let slot = (self.write_pos % self.samples.len() as u64) as usize;
        self.samples[slot] = sample;
        self.write_pos += 1;
    }

    /// The sample pushed `lag` pushes ago (0 = latest).
    ///
    /// Returns 0 for lags not yet written or already evicted; a run starts
    /// from a dry history.
    pub fn lagged(&self, lag: usize) -> f64 {
        if lag >= self.len() {
            return 0.0;
        }
        let pos = self.write_pos - 1 - lag as u64;
        self.samples[(pos % self.samples.len() as u64) as usize]
    }

    /// Discrete convolution of the history with `weights`, where
    /// `weights[j]` applies to the sample at lag `j`.
    pub fn convolve(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .take(self.len())
            .enumerate()
            .map(|(lag, w)| w * self.lagged(lag))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_history_reads_dry() {
        let h = RainHistory::new(4);
        assert!(h.is_empty());
        assert_eq!(h.lagged(0), 0.0);
        assert_eq!(h.convolve(&[1.0, 1.0]), 0.0);
    }

    #[test]
    fn lag_zero_is_latest() {
        let mut h = RainHistory::new(3);
        h.push(1.0);
        h.push(2.0);
        assert_eq!(h.lagged(0), 2.0);
        assert_eq!(h.lagged(1), 1.0);
        assert_eq!(h.lagged(2), 0.0);
    }

    #[test]
    fn oldest_sample_is_evicted() {
        let mut h = RainHistory::new(2);
        for v in [1.0, 2.0, 3.0] {
            h.push(v);
        }
        assert_eq!(h.len(), 2);
        assert_eq!(h.lagged(0), 3.0);
        assert_eq!(h.lagged(1), 2.0);
        assert_eq!(h.lagged(2), 0.0);
    }

    #[test]
    fn zero_capacity_is_promoted_to_one() {
        let mut h = RainHistory::new(0);
        h.push(5.0);
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.lagged(0), 5.0);
    }

    #[test]
    fn convolve_weights_by_lag() {
        let mut h = RainHistory::new(3);
        h.push(1.0);
        h.push(10.0);
        // 0.5·10 + 0.25·1
        assert!((h.convolve(&[0.5, 0.25, 1.0]) - 5.25).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn keeps_exactly_the_last_capacity_samples(
            cap in 1usize..16,
            values in prop::collection::vec(0.0f64..10.0, 0..64),
        ) {
            let mut h = RainHistory::new(cap);
            for &v in &values {
                h.push(v);
            }
            let kept = values.len().min(cap);
            prop_assert_eq!(h.len(), kept);
            for lag in 0..kept {
                prop_assert_eq!(h.lagged(lag), values[values.len() - 1 - lag]);
            }
            prop_assert_eq!(h.lagged(kept), 0.0);
        }
    }
}
