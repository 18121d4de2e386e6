//! Forward-backward (zero-phase) IIR filtering.
//!
//! Matches `scipy.signal.filtfilt(b, a, x)` with its defaults:
//! `padtype='odd'`, `padlen = 3 · max(len(a), len(b))`, and steady-state
//! initial conditions from `lfilter_zi` scaled by the first sample of each
//! pass. Running the filter twice in opposite directions cancels the phase
//! response, so no sample delay is introduced.
use crate::error::{Result, SyncError};
use crate::filter::design::IirCoeffs;

/// Apply `coeffs` forward and backward over `x`.
///
/// Returns a vector of the same length as `x`. `x` must be longer than the
/// odd-extension pad (`3 · coeffs.len()` samples).
pub fn filtfilt(coeffs: &IirCoeffs, x: &[f64]) -> Result<Vec<f64>> {
    let edge = 3 * coeffs.len();
    if x.len() <= edge {
        return Err(SyncError::SignalTooShort { len: x.len(), min: edge + 1 });
    }

    let ext = odd_extend(x, edge);
    let zi = lfilter_zi(coeffs);

    // Forward pass.
    let zi_fwd: Vec<f64> = zi.iter().map(|&z| z * ext[0]).collect();
    let mut y = lfilter(coeffs, &ext, Some(&zi_fwd));

    // Backward pass.
    y.reverse();
    let zi_bwd: Vec<f64> = zi.iter().map(|&z| z * y[0]).collect();
    let mut y = lfilter(coeffs, &y, Some(&zi_bwd));
    y.reverse();

    Ok(y[edge..edge + x.len()].to_vec())
}

/// Direct-form II transposed IIR filter (`scipy.signal.lfilter`).
///
/// `zi`, when given, must have `coeffs.len() - 1` entries.
pub fn lfilter(coeffs: &IirCoeffs, x: &[f64], zi: Option<&[f64]>) -> Vec<f64> {
    let n = coeffs.len();
    let (b, a) = normalised(coeffs);
    let mut z: Vec<f64> = match zi {
        Some(zi) => zi.to_vec(),
        None => vec![0.0; n - 1],
    };

    let mut y = Vec::with_capacity(x.len());
    for &xn in x {
        let yn = b[0] * xn + z.first().copied().unwrap_or(0.0);
        for k in 0..n.saturating_sub(2) {
            z[k] = b[k + 1] * xn + z[k + 1] - a[k + 1] * yn;
        }
        if n > 1 {
            z[n - 2] = b[n - 1] * xn - a[n - 1] * yn;
        }
        y.push(yn);
    }
    y
}

/// Steady-state initial conditions for a unit step (`scipy.signal.lfilter_zi`).
///
/// Solves `zi = A·zi + B` with the closed form for a companion matrix:
///   zi[0] = Σ(b[1:] − a[1:]·b[0]) / (1 + Σ a[1:])
///   zi[k] = (1 + Σ_{j≤k} a[j]) · zi[0] − Σ_{j≤k} (b[j] − a[j]·b[0])
pub fn lfilter_zi(coeffs: &IirCoeffs) -> Vec<f64> {
    let n = coeffs.len();
    if n < 2 {
        return vec![];
    }
    let (b, a) = normalised(coeffs);

    let b_sum: f64 = (1..n).map(|k| b[k] - a[k] * b[0]).sum();
    let a_sum: f64 = 1.0 + a[1..].iter().sum::<f64>();

    let mut zi = vec![0.0; n - 1];
    zi[0] = b_sum / a_sum;
    let mut asum = 1.0;
    let mut csum = 0.0;
    for k in 1..n - 1 {
        asum += a[k];
        csum += b[k] - a[k] * b[0];
        zi[k] = asum * zi[0] - csum;
    }
    zi
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Pad `b` and `a` to the same length and divide through by `a[0]`.
fn normalised(coeffs: &IirCoeffs) -> (Vec<f64>, Vec<f64>) {
    let n = coeffs.len();
    let a0 = coeffs.a.first().copied().unwrap_or(1.0);
    let pad = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .map(|&c| c / a0)
            .chain(std::iter::repeat(0.0))
            .take(n)
            .collect()
    };
    (pad(&coeffs.b), pad(&coeffs.a))
}

/// Odd extension (matches `scipy.signal._arraytools.odd_ext`).
///
/// Left:  `pad[i] = 2*x[0] - x[n-i]`   for i in 0..n
/// Right: `pad[i] = 2*x[-1] - x[-(i+2)]` for i in 0..n
///
/// Caller guarantees `n < x.len()`.
fn odd_extend(x: &[f64], n: usize) -> Vec<f64> {
    let len = x.len();
    let mut out = Vec::with_capacity(len + 2 * n);

    let first = x[0];
    for i in (1..=n).rev() {
        out.push(2.0 * first - x[i]);
    }

    out.extend_from_slice(x);

    let last = x[len - 1];
    for i in 1..=n {
        out.push(2.0 * last - x[len - 1 - i]);
    }
    out
}
