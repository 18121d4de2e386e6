//! Detrending of the external reference channel before artifact search.
//!
//! Matches `scipy.signal.filtfilt(*scipy.signal.butter(1, 0.05, 'highpass'), x)`:
//! a first-order Butterworth highpass at 5 % of Nyquist, run forward and
//! backward so no delay is introduced.
use crate::error::{Result, SyncError};
use crate::filter::{butter_highpass, filtfilt};

/// Default normalised cutoff (fraction of Nyquist).
pub const DETREND_CUTOFF: f64 = 0.05;

/// Remove slow drift and offset from `signal` with the default cutoff.
pub fn detrend(signal: &[f64]) -> Result<Vec<f64>> {
    detrend_with_cutoff(signal, DETREND_CUTOFF)
}

/// Remove slow drift and offset from `signal`, cutoff `wn` × Nyquist.
///
/// `wn` outside `(0, 1)` is a [`SyncError::InvalidConfig`].
pub fn detrend_with_cutoff(signal: &[f64], wn: f64) -> Result<Vec<f64>> {
    if !(wn > 0.0 && wn < 1.0) {
        return Err(SyncError::InvalidConfig(format!(
            "detrend cutoff must lie in (0, 1) × Nyquist, got {wn}"
        )));
    }
    filtfilt(&butter_highpass(wn), signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_drift_is_flattened() {
        let x: Vec<f64> = (0..5000).map(|i| 2.0 + 0.01 * i as f64).collect();
        let y = detrend(&x).unwrap();
        // A first-order highpass leaves a small constant for a ramp input;
        // it must be far below the original drift.
        let interior = &y[200..y.len() - 200];
        let max_val = interior.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(max_val < 0.5, "drift not removed: max={max_val}");
    }

    #[test]
    fn spike_position_is_kept() {
        let mut x = vec![0.0_f64; 3000];
        x[1500] = -1.0;
        let y = detrend(&x).unwrap();
        let argmin = y.iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmin, 1500);
    }

    #[test]
    fn cutoff_outside_unit_interval_is_rejected() {
        let x = vec![0.0_f64; 100];
        for wn in [0.0, 1.0, -0.2, 3.0, f64::NAN] {
            let err = detrend_with_cutoff(&x, wn).unwrap_err();
            assert!(matches!(err, SyncError::InvalidConfig(_)), "wn = {wn}: {err}");
        }
    }
}
