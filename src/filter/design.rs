//! IIR filter design matching `scipy.signal.butter`.
//!
//! Only the first-order Butterworth highpass is needed: the analog prototype
//! `H(s) = s / (s + ω)` is prewarped and mapped through the bilinear
//! transform at `fs = 2` (normalised frequency, Nyquist = 1):
//!   • t  = tan(π · wn / 2)
//!   • b  = [1, −1] / (1 + t)
//!   • a  = [1, (t − 1) / (t + 1)]
use std::f64::consts::PI;

/// Numerator / denominator coefficients of a digital IIR filter, `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoeffs {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl IirCoeffs {
    /// Filter order + 1 (the longer of `b` and `a`).
    pub fn len(&self) -> usize {
        self.b.len().max(self.a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Design a first-order Butterworth highpass.
///
/// `wn` is the cutoff as a fraction of the Nyquist frequency (`0 < wn < 1`).
/// Matches `scipy.signal.butter(1, wn, 'highpass')`.
pub fn butter_highpass(wn: f64) -> IirCoeffs {
    assert!(wn > 0.0 && wn < 1.0, "butter_highpass requires 0 < wn < 1, got {wn}");
    let t = (PI * wn / 2.0).tan();
    let b0 = 1.0 / (1.0 + t);
    IirCoeffs {
        b: vec![b0, -b0],
        a: vec![1.0, (t - 1.0) / (t + 1.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highpass_matches_scipy_005() {
        // scipy.signal.butter(1, 0.05, 'highpass')
        let c = butter_highpass(0.05);
        approx::assert_abs_diff_eq!(c.b[0], 0.927_040_3, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(c.b[1], -0.927_040_3, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(c.a[1], -0.854_080_7, epsilon = 1e-6);
    }

    #[test]
    fn highpass_blocks_dc() {
        // H(z = 1) = sum(b) / sum(a) = 0
        let c = butter_highpass(0.2);
        let s: f64 = c.b.iter().sum();
        approx::assert_abs_diff_eq!(s, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn highpass_unit_gain_at_nyquist() {
        // H(z = −1) = (b0 − b1) / (1 − a1) = 1
        for wn in [0.01, 0.05, 0.3, 0.8] {
            let c = butter_highpass(wn);
            let g = (c.b[0] - c.b[1]) / (c.a[0] - c.a[1]);
            approx::assert_abs_diff_eq!(g, 1.0, epsilon = 1e-12);
        }
    }
}
