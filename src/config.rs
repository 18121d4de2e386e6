//! Synchronization configuration.
//!
//! [`SyncConfig`] holds every tunable of a synchronization run. All fields
//! have sensible defaults. The per-detector knobs live in their own parameter
//! structs, carried by the detection method that uses them.
use serde::{Deserialize, Serialize};

use crate::detect::IntracranialMethod;
use crate::error::{Result, SyncError};

/// Whether a human confirms each automated detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Every detection goes through the [`Reviewer`](crate::manual::Reviewer)
    /// gate; failures escalate to the next method or to manual selection.
    #[default]
    Interactive,
    /// Accept the first candidate of the first method that yields one.
    /// Manual methods are skipped and detector failures are hard errors.
    Automated,
}

/// Configuration for a full synchronization run.
///
/// ```
/// use resync::{SyncConfig, ReviewMode};
///
/// let cfg = SyncConfig {
///     crop_both: false,              // keep the intracranial recording intact
///     mode:      ReviewMode::Automated,
///     ..SyncConfig::default()
/// };
/// assert_eq!(cfg.pre_roll_secs, 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Crop both recordings `pre_roll_secs` before their anchors (`true`) or
    /// keep the intracranial recording as the untouched reference (`false`).
    ///
    /// Default: `true`.
    pub crop_both: bool,

    /// Pre-artifact context kept in front of each anchor when `crop_both`.
    ///
    /// Default: `1.0` s.
    pub pre_roll_secs: f64,

    /// Normalised highpass cutoff (fraction of Nyquist) used to detrend the
    /// external reference channel before the artifact search.
    ///
    /// Default: `0.05`.
    pub detrend_cutoff: f64,

    /// Parameters of the external fixed-threshold detector.
    pub external: ExternalParams,

    /// Intracranial methods in the order they are tried.
    ///
    /// Default: kernel 2, kernel 1, manual.
    pub methods: Vec<IntracranialMethod>,

    /// Confirmation policy.
    ///
    /// Default: [`ReviewMode::Interactive`].
    pub mode: ReviewMode,

    /// Timeshift magnitude above which a measurement is flagged as suspicious
    /// (dropped samples or packet loss in one recording).
    ///
    /// Default: `100.0` ms.
    pub timeshift_warn_ms: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            crop_both: true,
            pre_roll_secs: 1.0,
            detrend_cutoff: crate::detrend::DETREND_CUTOFF,
            external: ExternalParams::default(),
            methods: vec![
                IntracranialMethod::Kernel2(KernelParams::default()),
                IntracranialMethod::Kernel1(KernelParams::default()),
                IntracranialMethod::Manual,
            ],
            mode: ReviewMode::Interactive,
            timeshift_warn_ms: 100.0,
        }
    }
}

impl SyncConfig {
    /// Reject values the pipeline cannot run with, typically from a
    /// hand-written config file.
    pub fn validate(&self) -> Result<()> {
        if !(self.detrend_cutoff > 0.0 && self.detrend_cutoff < 1.0) {
            return Err(SyncError::InvalidConfig(format!(
                "detrend_cutoff must lie in (0, 1), got {}",
                self.detrend_cutoff
            )));
        }
        if !(self.pre_roll_secs >= 0.0 && self.pre_roll_secs.is_finite()) {
            return Err(SyncError::InvalidConfig(format!(
                "pre_roll_secs must be a non-negative number of seconds, got {}",
                self.pre_roll_secs
            )));
        }
        Ok(())
    }
}

/// Fixed-threshold detector for the external bipolar channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalParams {
    /// First sample considered by the forward scan. Lets a caller skip a
    /// leading deflection that is not the stimulation onset.
    pub start_index: usize,
    /// Trailing samples excluded from the polarity check.
    pub polarity_guard: usize,
    /// Leading window whose peak-to-peak range calibrates the threshold.
    pub threshold_window_secs: f64,
    /// `threshold = -threshold_factor × ptp(leading window)`.
    pub threshold_factor: f64,
}

impl Default for ExternalParams {
    fn default() -> Self {
        Self {
            start_index: 0,
            polarity_guard: 1000,
            threshold_window_secs: 2.0,
            threshold_factor: 1.5,
        }
    }
}

/// Matched-filter detector for the intracranial channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    /// Minimum normalised response of a peak (fraction of the extreme).
    pub peak_height: f64,
    /// Window for the maximum of the confidence ratio.
    pub ratio_window_secs: f64,
    /// Window for the standard deviation of the confidence ratio.
    pub std_window_secs: f64,
    /// Below this ratio the recording probably holds no artifact train.
    pub min_ratio: f64,
    /// The low-ratio warning only applies to trains with more candidates
    /// than this; short trains have too few peaks for a stable ratio.
    pub ratio_min_candidates: usize,
    /// First positive and negative peaks closer than this trigger the
    /// width tie-break.
    pub tie_break_samples: usize,
    /// Level (fraction of the extreme) at which peak widths are measured.
    pub width_fraction: f64,
    /// Undo the inversion when the positive peak is this many times wider
    /// than the negative one. Heuristic, tune per recorder.
    pub width_ratio: f64,
    /// Half-width of the raw-signal window around each candidate.
    pub amplitude_half_window: usize,
    /// Maximum relative deviation from the median candidate amplitude.
    pub amplitude_tolerance: f64,
    /// Required deflection in the artifact direction, fraction of the median.
    pub polarity_fraction: f64,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            peak_height: 0.3,
            ratio_window_secs: 30.0,
            std_window_secs: 5.0,
            min_ratio: 8.0,
            ratio_min_candidates: 20,
            tie_break_samples: 50,
            width_fraction: 0.3,
            width_ratio: 2.0,
            amplitude_half_window: 5,
            amplitude_tolerance: 0.66,
            polarity_fraction: 0.5,
        }
    }
}

impl KernelParams {
    /// Whether a train of `n_candidates` peaks with confidence `ratio` looks
    /// like it holds no stimulation artifacts.
    pub fn low_confidence(&self, ratio: f64, n_candidates: usize) -> bool {
        n_candidates > self.ratio_min_candidates && ratio < self.min_ratio
    }
}

/// Threshold / percentile detector for the intracranial channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Leading window whose peak-to-peak range is the crossing threshold.
    pub window_secs: f64,
    /// Percentile of the pre-crossing absolute values bounding the onset.
    pub percentile: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { window_secs: 2.0, percentile: 95.0 }
    }
}

/// Number of samples in `secs` seconds at `sfreq`, `round(secs × sfreq)`.
pub(crate) fn secs_to_samples(secs: f64, sfreq: u32) -> usize {
    (secs * sfreq as f64).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_method_order() {
        let cfg = SyncConfig::default();
        let tags: Vec<&str> = cfg.methods.iter().map(|m| m.tag()).collect();
        assert_eq!(tags, ["2", "1", "manual"]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SyncConfig = serde_json::from_str(
            r#"{ "crop_both": false, "external": { "start_index": 4000 } }"#,
        ).unwrap();
        assert!(!cfg.crop_both);
        assert_eq!(cfg.external.start_index, 4000);
        assert_eq!(cfg.external.polarity_guard, 1000);
        assert_eq!(cfg.methods.len(), 3);
    }

    #[test]
    fn secs_to_samples_rounds() {
        assert_eq!(secs_to_samples(2.0, 500), 1000);
        assert_eq!(secs_to_samples(0.0013, 1000), 1);
        assert_eq!(secs_to_samples(-1.0, 1000), 0);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        assert!(SyncConfig::default().validate().is_ok());

        let cfg: SyncConfig = serde_json::from_str(r#"{ "detrend_cutoff": 1.0 }"#).unwrap();
        assert!(matches!(cfg.validate(), Err(SyncError::InvalidConfig(_))));

        let cfg = SyncConfig { pre_roll_secs: -0.5, ..SyncConfig::default() };
        assert!(matches!(cfg.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn low_confidence_needs_a_long_train() {
        let p = KernelParams::default();
        assert!(p.low_confidence(3.0, 21));
        assert!(!p.low_confidence(3.0, 20));
        assert!(!p.low_confidence(12.0, 40));
    }
}
