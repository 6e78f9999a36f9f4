//! Online mean/variance estimation for a single numeric feature stream

use serde::Serialize;

/// Running statistics for one tracked feature.
///
/// Uses the simple mean-then-variance recurrence rather than Welford's
/// algorithm: the mean is updated first and the variance is derived from
/// the already-updated mean. Numerical drift is acceptable for the
/// magnitudes involved (gas prices, ETH values, byte counts).
#[derive(Debug, Clone, Serialize)]
pub struct StatTracker {
    count: u64,
    mean: f64,
    std_dev: f64,
}

impl Default for StatTracker {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

impl StatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Standardized deviation of `value` from the running mean.
    /// The running std is floored to keep a flat stream from exploding
    /// the score.
    pub fn z_score(&self, value: f64, std_floor: f64) -> f64 {
        ((value - self.mean) / self.std_dev.max(std_floor)).abs()
    }

    /// Fold one observation into the running statistics.
    /// Callers score the observation first and update after; the tracker
    /// itself never resets.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let n = self.count as f64;
        self.mean = (self.mean * (n - 1.0) + value) / n;
        let variance =
            (self.std_dev.powi(2) * (n - 1.0) + (value - self.mean).powi(2)) / n;
        self.std_dev = variance.sqrt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_converges() {
        let mut t = StatTracker::new();
        for _ in 0..100 {
            t.update(20.0);
        }
        assert_eq!(t.count(), 100);
        assert!((t.mean() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_std_reflects_spread() {
        let mut narrow = StatTracker::new();
        let mut wide = StatTracker::new();
        for i in 0..50 {
            narrow.update(10.0 + (i % 2) as f64);
            wide.update(10.0 + (i % 2) as f64 * 100.0);
        }
        assert!(wide.std_dev() > narrow.std_dev());
    }

    #[test]
    fn test_z_score_floor() {
        let mut t = StatTracker::new();
        // Constant stream drives the variance toward zero
        for _ in 0..50 {
            t.update(5.0);
        }
        // Without the floor this would be huge; with it the score is bounded
        let z = t.z_score(6.0, 0.1);
        assert!(z <= 10.0 + 1e-9, "z was {}", z);
    }

    #[test]
    fn test_z_score_is_absolute() {
        let mut t = StatTracker::new();
        for v in [10.0, 12.0, 8.0, 11.0, 9.0] {
            t.update(v);
        }
        assert!(t.z_score(0.0, 0.1) > 0.0);
        assert!(t.z_score(100.0, 0.1) > 0.0);
    }
}
