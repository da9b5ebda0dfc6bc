//! Bounded exponential-moving-average confidence smoother.
//!
//! Raw detection strength is noisy; the gating thresholds compare against a
//! smoothed value so a single flickering frame cannot lock or release
//! intent on its own.

/// EMA filter over a noisy scalar, clamped to [0, 1].
#[derive(Debug, Clone)]
pub struct ConfidenceSmoother {
    /// Weight of the newest sample in (0, 1].
    alpha: f64,
    value: Option<f64>,
}

impl ConfidenceSmoother {
    /// Create a smoother with the given blend factor. `alpha` is clamped to
    /// (0, 1]; 1.0 disables smoothing entirely.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            value: None,
        }
    }

    /// Feed one sample and return the smoothed value.
    ///
    /// On an empty history the (clamped) sample passes through unchanged.
    /// Non-finite input is treated as 0.
    pub fn smooth(&mut self, sample: f64) -> f64 {
        let clamped = if sample.is_finite() {
            sample.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let next = match self.value {
            None => clamped,
            Some(prev) => prev + self.alpha * (clamped - prev),
        };
        self.value = Some(next.clamp(0.0, 1.0));
        next
    }

    /// Current smoothed value, 0 before any sample.
    pub fn value(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    /// Clear history; the next sample passes through unchanged.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

impl Default for ConfidenceSmoother {
    fn default() -> Self {
        Self::new(0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut s = ConfidenceSmoother::new(0.3);
        assert_eq!(s.smooth(0.6), 0.6);
    }

    #[test]
    fn test_clamps_out_of_range_input() {
        let mut s = ConfidenceSmoother::new(0.3);
        assert_eq!(s.smooth(-0.5), 0.0);
        s.reset();
        assert_eq!(s.smooth(1.5), 1.0);
    }

    #[test]
    fn test_output_always_in_unit_range() {
        let mut s = ConfidenceSmoother::new(0.9);
        for sample in [2.0, -3.0, 0.5, f64::NAN, 1.0, 0.0] {
            let v = s.smooth(sample);
            assert!((0.0..=1.0).contains(&v), "out of range: {}", v);
        }
    }

    #[test]
    fn test_converges_toward_constant_input() {
        let mut s = ConfidenceSmoother::new(0.3);
        s.smooth(0.0);
        let mut v = 0.0;
        for _ in 0..50 {
            v = s.smooth(1.0);
        }
        assert!(v > 0.99, "should converge toward 1.0, got {}", v);
    }

    #[test]
    fn test_single_spike_is_damped() {
        let mut s = ConfidenceSmoother::new(0.3);
        s.smooth(0.0);
        let after_spike = s.smooth(1.0);
        assert!(after_spike < 0.5, "spike should be damped, got {}", after_spike);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut s = ConfidenceSmoother::new(0.3);
        s.smooth(1.0);
        s.reset();
        assert_eq!(s.value(), 0.0);
        assert_eq!(s.smooth(0.4), 0.4);
    }

    #[test]
    fn test_nan_reads_as_zero() {
        let mut s = ConfidenceSmoother::new(1.0);
        assert_eq!(s.smooth(f64::NAN), 0.0);
    }

    #[test]
    fn test_alpha_one_tracks_input_exactly() {
        let mut s = ConfidenceSmoother::new(1.0);
        s.smooth(0.2);
        assert_eq!(s.smooth(0.9), 0.9);
    }
}
