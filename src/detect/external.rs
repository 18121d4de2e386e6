//! Fixed-threshold detector for the external bipolar channel.
//!
//! The stimulation onset shows up in the external recorder as a sharp,
//! high-frequency downward deflection. The channel is expected to be
//! detrended (see [`crate::detrend`]) and to start with stimulation off.
//!
//! 1. Polarity: if `|max|` exceeds `|min|` over all but the last
//!    `polarity_guard` samples, the channel is flipped so artifacts point down.
//! 2. `threshold = -threshold_factor × ptp(first threshold_window_secs)`.
//! 3. The first local minimum at or below the threshold, scanning forward
//!    from `start_index`, is the onset.
use tracing::{debug, info};

use crate::config::{secs_to_samples, ExternalParams};
use crate::error::{Result, Side, SyncError};
use crate::stats::ptp;

/// Time (s) of the first stimulation artifact in the external channel.
///
/// Returns [`SyncError::NoArtifactFound`] when the scan reaches the end of the
/// signal without a qualifying local minimum.
pub fn find_external_artifact(signal: &[f64], sfreq: u32, params: &ExternalParams) -> Result<f64> {
    let index = find_external_artifact_index(signal, sfreq, params)?;
    let time = index as f64 / sfreq as f64;
    info!(index, time, "external artifact found");
    Ok(time)
}

/// Sample index of the first stimulation artifact in the external channel.
pub fn find_external_artifact_index(
    signal: &[f64],
    sfreq: u32,
    params: &ExternalParams,
) -> Result<usize> {
    let not_found = || SyncError::NoArtifactFound {
        side: Side::External,
        method: "fixed-threshold".into(),
    };
    let n = signal.len();
    if n < 3 {
        return Err(not_found());
    }

    let sign = if is_reversed(signal, params.polarity_guard) {
        info!("external signal is reversed, flipping polarity");
        -1.0
    } else {
        1.0
    };

    let window = secs_to_samples(params.threshold_window_secs, sfreq).min(n);
    let threshold = -params.threshold_factor * ptp(&signal[..window]);
    debug!(threshold, window, "external artifact threshold");

    // Sign flip commutes with ptp, so only the scanned samples are negated.
    let at = |i: usize| sign * signal[i];
    (params.start_index.max(1)..n - 1)
        .find(|&q| at(q) <= threshold && at(q) < at(q + 1) && at(q) < at(q - 1))
        .ok_or_else(not_found)
}

/// `true` when the positive excursion dominates, i.e. artifacts point up.
fn is_reversed(signal: &[f64], guard: usize) -> bool {
    let head = &signal[..signal.len().saturating_sub(guard)];
    let head = if head.is_empty() { signal } else { head };
    let (lo, hi) = head.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    hi.abs() > lo.abs()
}
