//! Intracranial (LFP) stimulation-artifact detectors.
//!
//! Threshold method (`"thresh"`):
//!   thresh  = ptp(signal[0 .. 2 s])
//!   cross   = first i with |signal[i]| > thresh
//!   onset   = last i < cross with |signal[i]| ≤ P95(|signal[..cross]|)
//!
//! Kernel methods (`"1"`, `"2"`):
//!   1. res = sliding dot product of the template, normalised by max(res)
//!   2. positive and negative peaks (≥ 0.3 of the extreme, ≥ 1 s apart)
//!   3. a negative peak before the first positive one means the channel is
//!      inverted, unless both peaks are within 50 samples and the positive one
//!      is more than twice as wide (a small genuine LFP deflection)
//!   4. candidates whose raw amplitude deviates from the median by more than
//!      66 % are dropped, then those not deflecting in the artifact direction
use tracing::{debug, info, warn};

use crate::config::{secs_to_samples, KernelParams, ThresholdParams};
use crate::detect::kernel::{kernel_response, Kernel};
use crate::detect::IntracranialMethod;
use crate::error::{Result, Side, SyncError};
use crate::manual::{manual_select, ManualPicker};
use crate::stats::{max_abs, median, percentile, ptp, std};

/// Outcome of an intracranial detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Candidate onset sample indices, ascending. Never empty.
    pub candidates: Vec<usize>,
    /// The kernel detector judged the channel inverted.
    pub inverted: bool,
    /// `max(res[..30 s]) / std(res[..5 s])`; kernel methods only.
    pub confidence_ratio: Option<f64>,
    /// Long train with a ratio below `min_ratio`; timings may be wrong.
    pub low_confidence: bool,
}

impl Detection {
    /// First candidate, the primary anchor.
    pub fn first(&self) -> usize {
        self.candidates[0]
    }
}

/// Run `method` on the intracranial reference channel.
///
/// [`IntracranialMethod::Manual`] defers to `picker`; its single snapped pick
/// becomes the only candidate.
pub fn find_intracranial_artifact(
    signal: &[f64],
    sfreq: u32,
    method: &IntracranialMethod,
    picker: &mut dyn ManualPicker,
) -> Result<Detection> {
    match method {
        IntracranialMethod::Threshold(params) => find_threshold_artifact(signal, sfreq, params),
        IntracranialMethod::Kernel1(params) => find_kernel_artifacts(signal, sfreq, Kernel::Edge, params),
        IntracranialMethod::Kernel2(params) => {
            find_kernel_artifacts(signal, sfreq, Kernel::EdgeRecovery, params)
        }
        IntracranialMethod::Manual => {
            let time = manual_select(
                picker,
                Side::Intracranial,
                signal,
                sfreq,
                "select the last sample before the first artifact deflection",
            )?;
            Ok(Detection {
                candidates: vec![(time * sfreq as f64).round() as usize],
                inverted: false,
                confidence_ratio: None,
                low_confidence: false,
            })
        }
    }
}

/// Threshold / percentile detector.
pub fn find_threshold_artifact(
    signal: &[f64],
    sfreq: u32,
    params: &ThresholdParams,
) -> Result<Detection> {
    let not_found = || SyncError::NoArtifactFound {
        side: Side::Intracranial,
        method: "thresh".into(),
    };

    let window = secs_to_samples(params.window_secs, sfreq).min(signal.len());
    let thresh = ptp(&signal[..window]);
    let abs: Vec<f64> = signal.iter().map(|v| v.abs()).collect();

    let cross = abs.iter().position(|&v| v > thresh).ok_or_else(not_found)?;
    if cross == 0 {
        return Err(not_found());
    }

    let bound = percentile(&abs[..cross], params.percentile);
    let onset = abs[..cross].iter().rposition(|&v| v <= bound).ok_or_else(not_found)?;
    debug!(thresh, cross, bound, onset, "threshold detector");

    Ok(Detection {
        candidates: vec![onset],
        inverted: false,
        confidence_ratio: None,
        low_confidence: false,
    })
}

/// Matched-filter detector (kernel 1 or 2).
pub fn find_kernel_artifacts(
    signal: &[f64],
    sfreq: u32,
    kernel: Kernel,
    params: &KernelParams,
) -> Result<Detection> {
    let taps = kernel.taps();
    if signal.len() <= taps.len() + 2 {
        return Err(SyncError::SignalTooShort { len: signal.len(), min: taps.len() + 3 });
    }
    let not_found = || SyncError::NoArtifactFound {
        side: Side::Intracranial,
        method: match kernel {
            Kernel::Edge => "1".into(),
            Kernel::EdgeRecovery => "2".into(),
        },
    };

    let mut res = kernel_response(signal, &taps);
    let peak = res.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(peak > 0.0) || !peak.is_finite() {
        return Err(not_found());
    }
    res.iter_mut().for_each(|v| *v /= peak);

    // After normalisation the maximum is exactly 1.
    let res_min = res.iter().copied().fold(f64::INFINITY, f64::min);
    let ratio_win = secs_to_samples(params.ratio_window_secs, sfreq).min(res.len());
    let std_win = secs_to_samples(params.std_window_secs, sfreq).min(res.len());
    let ratio_max = res[..ratio_win].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ratio = ratio_max / std(&res[..std_win]);

    let distance = sfreq as usize;
    let pos_idx = crate::peaks::find_peaks(&res, params.peak_height, distance);
    let neg_res: Vec<f64> = res.iter().map(|v| -v).collect();
    let neg_idx = crate::peaks::find_peaks(&neg_res, -params.peak_height * res_min, distance);
    debug!(?pos_idx, ?neg_idx, ratio, "kernel peaks");

    let inverted = is_inverted(&res, res_min, &pos_idx, &neg_idx, params);
    let candidates = if inverted { neg_idx } else { pos_idx };

    let low_confidence = params.low_confidence(ratio, candidates.len());
    if low_confidence {
        warn!(
            ratio,
            min_ratio = params.min_ratio,
            candidates = candidates.len(),
            "the intracranial signal probably contains no stimulation artifacts; \
             candidate timings may be wrong"
        );
    }

    let candidates = reject_amplitude_outliers(signal, &candidates, inverted, params);
    if candidates.is_empty() {
        return Err(not_found());
    }
    info!(first = candidates[0], count = candidates.len(), inverted, "intracranial artifacts found");

    Ok(Detection { candidates, inverted, confidence_ratio: Some(ratio), low_confidence })
}

/// Keep only amplitude-consistent candidates that deflect in the artifact
/// direction.
///
/// For each candidate the largest absolute raw value within
/// `±amplitude_half_window` samples is compared to the median over all
/// candidates; deviations beyond `amplitude_tolerance × median` are dropped.
/// Survivors must then reach below `-polarity_fraction × median` (or above
/// `+polarity_fraction × median` when `inverted`).
pub fn reject_amplitude_outliers(
    signal: &[f64],
    candidates: &[usize],
    inverted: bool,
    params: &KernelParams,
) -> Vec<usize> {
    let hw = params.amplitude_half_window;
    let window = |i: usize| &signal[i.saturating_sub(hw)..i.saturating_add(hw).min(signal.len())];

    let heights: Vec<f64> = candidates.iter().map(|&i| max_abs(window(i))).collect();
    let med = median(&heights);

    candidates
        .iter()
        .zip(&heights)
        .filter(|&(_, &h)| (h - med).abs() < med * params.amplitude_tolerance)
        .map(|(&i, _)| i)
        .filter(|&i| {
            let w = window(i);
            if inverted {
                w.iter().copied().fold(f64::NEG_INFINITY, f64::max) > med * params.polarity_fraction
            } else {
                w.iter().copied().fold(f64::INFINITY, f64::min) < -med * params.polarity_fraction
            }
        })
        .collect()
}

/// Polarity decision with the width tie-break.
fn is_inverted(
    res: &[f64],
    res_min: f64,
    pos_idx: &[usize],
    neg_idx: &[usize],
    params: &KernelParams,
) -> bool {
    let (pos, neg) = match (pos_idx.first(), neg_idx.first()) {
        (Some(&p), Some(&n)) => (p, n),
        (None, Some(_)) => return true,
        _ => return false,
    };
    if neg >= pos {
        return false;
    }
    info!("intracranial signal is inverted");

    if pos - neg < params.tie_break_samples {
        let width_pos = crate::peaks::width_above(res, pos, params.width_fraction);
        let width_neg = crate::peaks::width_below(res, neg, res_min * params.width_fraction);
        debug!(width_pos, width_neg, "inversion tie-break");
        if width_pos as f64 > params.width_ratio * width_neg as f64 {
            info!("inversion undone, negative response too narrow");
            return false;
        }
        if width_pos.abs_diff(width_neg) <= 1 {
            debug!("ambiguous polarity, keeping inverted");
        }
    }
    true
}
