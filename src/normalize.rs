//! Normalizer - maps a combined deviation onto the bounded 0-100 scale

use serde::{Deserialize, Serialize};

/// Lower bound of the index scale
pub const SCALE_MIN: f64 = 0.0;
/// Upper bound of the index scale
pub const SCALE_MAX: f64 = 100.0;

/// `clamp(mean + sigma * z, 0, 100)`
///
/// `sigma` is the sensitivity: one unit of deviation moves the score by
/// `sigma` points. Out-of-range results are saturated, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalizer {
    pub mean: f64,
    pub sigma: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            mean: 50.0,
            sigma: 15.0,
        }
    }
}

impl Normalizer {
    pub fn new(mean: f64, sigma: f64) -> Self {
        Self { mean, sigma }
    }

    /// Bounded score for deviation `z`. NaN maps to `mean`.
    pub fn normalize(&self, z: f64) -> f64 {
        if z.is_nan() {
            return self.mean.clamp(SCALE_MIN, SCALE_MAX);
        }
        let raw = self.mean + self.sigma * z;
        if raw.is_nan() {
            // inf * 0 sigma
            return self.mean.clamp(SCALE_MIN, SCALE_MAX);
        }
        raw.clamp(SCALE_MIN, SCALE_MAX)
    }

    /// Inverse mapping: deviation of `value` from `mean` in sigma units
    pub fn deviation(&self, value: f64) -> f64 {
        (value - self.mean) / self.sigma
    }
}

/// Round to one decimal place
///
/// Rounds the exact binary value, so `0.15` (stored just below 0.15) becomes
/// `0.1`; exact ties go to even. Non-finite input is returned unchanged.
pub fn round1(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{:.1}", x).parse().unwrap_or(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_mean() {
        assert_eq!(Normalizer::default().normalize(0.0), 50.0);
    }

    #[test]
    fn test_one_sigma() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(1.0), 65.0);
        assert_eq!(n.normalize(-2.0), 20.0);
    }

    #[test]
    fn test_saturates() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(10.0), 100.0);
        assert_eq!(n.normalize(-10.0), 0.0);
        assert_eq!(n.normalize(f64::INFINITY), 100.0);
        assert_eq!(n.normalize(f64::NEG_INFINITY), 0.0);
        assert_eq!(n.normalize(f64::NAN), 50.0);
    }

    #[test]
    fn test_always_bounded() {
        let n = Normalizer::default();
        let mut z = -50.0;
        while z <= 50.0 {
            let v = n.normalize(z);
            assert!((SCALE_MIN..=SCALE_MAX).contains(&v), "z={} gave {}", z, v);
            z += 0.37;
        }
    }

    #[test]
    fn test_deviation_inverts_normalize() {
        let n = Normalizer::default();
        let v = 68.4;
        assert!((n.normalize(n.deviation(v)) - v).abs() < 1e-9);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(-1.6000000000000014), -1.6);
        assert_eq!(round1(68.44), 68.4);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_round1_uses_binary_value() {
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(-0.15), -0.1);
        assert_eq!(round1(2.675), 2.7);
        assert!(round1(f64::NAN).is_nan());
        assert_eq!(round1(f64::INFINITY), f64::INFINITY);
    }
}
