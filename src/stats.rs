//! Summary statistics used by the artifact detectors.
//!
//! Each helper matches the numpy function of the same name:
//!   `ptp`        — `np.ptp`
//!   `std`        — `np.std` (ddof = 0)
//!   `median`     — `np.median`
//!   `percentile` — `np.percentile` with linear interpolation
//!
//! Empty input returns `0.0` everywhere instead of NaN.

/// Peak-to-peak range `max(x) - min(x)`.
pub fn ptp(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let (lo, hi) = x.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    hi - lo
}

/// Population standard deviation.
pub fn std(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|&v| {
        let d = v - mean; d * d
    }).sum::<f64>() / n;
    var.sqrt()
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `q`-th percentile (`0 ≤ q ≤ 100`), linearly interpolated between ranks.
pub fn percentile(x: &[f64], q: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Largest absolute value in `x`.
pub fn max_abs(x: &[f64]) -> f64 {
    x.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}
