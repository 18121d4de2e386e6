//! Residual clock drift between two synchronized recordings.
//!
//! After cropping, the first artifact sits at the same time in both
//! recordings. Comparing a *later* pair of corresponding artifacts reveals how
//! far the two clocks drifted apart over the session:
//!
//! ```text
//! timeshift_ms = (t_external − t_lfp) × 1000
//! ```
//!
//! Large values (default > 100 ms) usually mean dropped samples or packet
//! loss in one recorder. They are reported, never rejected.
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{secs_to_samples, ExternalParams, KernelParams, SyncConfig};
use crate::detect::external::find_external_artifact_index;
use crate::detect::{find_kernel_artifacts, IntracranialMethod, Kernel};
use crate::detrend::detrend_with_cutoff;
use crate::error::{Result, Side};
use crate::manual::{manual_select, ManualPicker};
use crate::recording::Recording;

/// One drift measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeshiftMeasurement {
    /// `(external_time − lfp_time) × 1000`.
    pub timeshift_ms: f64,
    /// Time of the reference artifact in the synced intracranial recording (s).
    pub lfp_time: f64,
    /// Time of the reference artifact in the synced external recording (s),
    /// i.e. the recording duration over which the drift accumulated.
    pub reference_secs: f64,
    /// `|timeshift_ms|` exceeded the warning threshold.
    pub suspicious: bool,
}

/// Settings shared by [`measure_timeshift`] and [`estimate_timeshift`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeshiftOptions {
    /// Template for the automated intracranial search.
    pub kernel: Kernel,
    pub kernel_params: KernelParams,
    /// External detector settings; `start_index` is overridden by the search.
    pub external: ExternalParams,
    /// The external scan starts this long before the intracranial reference.
    pub search_margin_secs: f64,
    /// Artifact-free lead-in used to calibrate the external threshold. Must
    /// stay below the pre-roll of the synced recordings.
    pub baseline_secs: f64,
    pub detrend_cutoff: f64,
    pub warn_ms: f64,
}

impl Default for TimeshiftOptions {
    fn default() -> Self {
        Self {
            kernel: Kernel::EdgeRecovery,
            kernel_params: KernelParams::default(),
            external: ExternalParams::default(),
            search_margin_secs: 0.5,
            baseline_secs: 0.9,
            detrend_cutoff: crate::detrend::DETREND_CUTOFF,
            warn_ms: 100.0,
        }
    }
}

impl TimeshiftOptions {
    /// Options consistent with a synchronization run: first kernel method of
    /// the priority list, same external detector, cutoff and warning level.
    pub fn from_config(cfg: &SyncConfig) -> Self {
        let (kernel, kernel_params) = cfg
            .methods
            .iter()
            .find_map(|m| match m {
                IntracranialMethod::Kernel1(p) => Some((Kernel::Edge, p.clone())),
                IntracranialMethod::Kernel2(p) => Some((Kernel::EdgeRecovery, p.clone())),
                _ => None,
            })
            .unwrap_or((Kernel::EdgeRecovery, KernelParams::default()));
        Self {
            kernel,
            kernel_params,
            external: cfg.external.clone(),
            detrend_cutoff: cfg.detrend_cutoff,
            warn_ms: cfg.timeshift_warn_ms,
            ..Self::default()
        }
    }
}

/// Operator-driven drift measurement.
///
/// The operator picks the same late stimulation event in the synced
/// intracranial channel and in the detrended synced external channel.
pub fn measure_timeshift(
    lfp: &Recording,
    lfp_channel: usize,
    external: &Recording,
    external_channel: usize,
    picker: &mut dyn ManualPicker,
    opts: &TimeshiftOptions,
) -> Result<TimeshiftMeasurement> {
    let lfp_sig = lfp.channel_vec(lfp_channel)?;
    let ext_sig = detrend_with_cutoff(&external.channel_vec(external_channel)?, opts.detrend_cutoff)?;

    let lfp_time = manual_select(
        picker,
        Side::Intracranial,
        &lfp_sig,
        lfp.sfreq(),
        "select the sample corresponding to the last artifact in the intracranial recording",
    )?;
    let ext_time = manual_select(
        picker,
        Side::External,
        &ext_sig,
        external.sfreq(),
        "select the sample corresponding to the last artifact in the external recording",
    )?;
    Ok(measurement(lfp_time, ext_time, opts.warn_ms))
}

/// Detector-driven drift measurement.
///
/// The last kernel candidate of the synced intracranial channel is the
/// reference; the external detector then scans the detrended synced external
/// channel from `search_margin_secs` before it.
pub fn estimate_timeshift(
    lfp: &Recording,
    lfp_channel: usize,
    external: &Recording,
    external_channel: usize,
    opts: &TimeshiftOptions,
) -> Result<TimeshiftMeasurement> {
    let lfp_sig = lfp.channel_vec(lfp_channel)?;
    let det = find_kernel_artifacts(&lfp_sig, lfp.sfreq(), opts.kernel, &opts.kernel_params)?;
    // Candidates are never empty on success.
    let last = det.candidates[det.candidates.len() - 1];
    let lfp_time = last as f64 / lfp.sfreq() as f64;

    let ext_sig = detrend_with_cutoff(&external.channel_vec(external_channel)?, opts.detrend_cutoff)?;
    let params = ExternalParams {
        start_index: secs_to_samples(lfp_time - opts.search_margin_secs, external.sfreq()),
        threshold_window_secs: opts.baseline_secs,
        ..opts.external.clone()
    };
    let ext_idx = find_external_artifact_index(&ext_sig, external.sfreq(), &params)?;
    let ext_time = ext_idx as f64 / external.sfreq() as f64;

    Ok(measurement(lfp_time, ext_time, opts.warn_ms))
}

fn measurement(lfp_time: f64, ext_time: f64, warn_ms: f64) -> TimeshiftMeasurement {
    let timeshift_ms = (ext_time - lfp_time) * 1000.0;
    let suspicious = timeshift_ms.abs() > warn_ms;
    if suspicious {
        warn!(
            timeshift_ms,
            "the timeshift is unusually high, consider checking for packet loss in the intracranial data"
        );
    } else {
        info!(timeshift_ms, reference_secs = ext_time, "timeshift measured");
    }
    TimeshiftMeasurement { timeshift_ms, lfp_time, reference_secs: ext_time, suspicious }
}
