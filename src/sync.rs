//! Crop engine: turn two artifact anchors into co-registered recordings.
//!
//! ```text
//! Both { pre_roll }   lfp  ──────|pre|▼──────────────┤ tail truncated
//!                     ext    ───|pre|▼──────────────────┤ to equal duration
//!
//! ExternalOnly        lfp  ───────────▼─────────────┤ untouched
//!                     ext     ────────▼───────────────┤ start shifted by
//!                                                       art_ext − art_lfp
//! ```
//!
//! Every start index is `round(t × sfreq)`, computed the same way on both
//! recordings. Starts outside `[0, n]` are clamped and flagged in the
//! [`CropReport`]; they are never an error. Durations are reconciled in exact
//! integer arithmetic (`len_a × sf_b` vs `len_b × sf_a`) so the two outputs
//! agree to within half a sample period of the shorter-rate recording.
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::error::Side;
use crate::recording::Recording;

/// How the two recordings are cropped around their anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum CropPolicy {
    /// Crop both `pre_roll_secs` before their anchors, then truncate the
    /// longer tail. Neither recording is the reference.
    Both { pre_roll_secs: f64 },
    /// Keep the intracranial recording untouched; shift and truncate only the
    /// external one.
    ExternalOnly,
}

impl CropPolicy {
    pub fn from_config(cfg: &SyncConfig) -> Self {
        if cfg.crop_both {
            CropPolicy::Both { pre_roll_secs: cfg.pre_roll_secs }
        } else {
            CropPolicy::ExternalOnly
        }
    }
}

/// Where each recording was cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropReport {
    pub lfp_start: usize,
    pub lfp_len: usize,
    pub external_start: usize,
    pub external_len: usize,
    /// The requested intracranial start fell outside the recording.
    pub lfp_start_clamped: bool,
    /// The requested external start fell outside the recording.
    pub external_start_clamped: bool,
    /// Duration of the synchronized intracranial output (s).
    pub duration_secs: f64,
}

impl CropReport {
    /// Human-readable notes on every clamp that happened.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = vec![];
        if self.lfp_start_clamped {
            out.push(format!("{} crop start clamped to sample {}", Side::Intracranial, self.lfp_start));
        }
        if self.external_start_clamped {
            out.push(format!("{} crop start clamped to sample {}", Side::External, self.external_start));
        }
        out
    }
}

/// The two co-registered recordings.
#[derive(Debug, Clone)]
pub struct SyncedPair {
    pub lfp: Recording,
    pub external: Recording,
    pub report: CropReport,
}

/// Crop `lfp` and `external` so their anchors line up.
///
/// `art_time_lfp` and `art_time_external` are anchor times in seconds from
/// the start of each recording. Channel names, channel order and sampling
/// frequencies are preserved.
pub fn synchronize(
    lfp: &Recording,
    external: &Recording,
    art_time_lfp: f64,
    art_time_external: f64,
    policy: CropPolicy,
) -> SyncedPair {
    let (sf_l, sf_e) = (lfp.sfreq(), external.sfreq());
    let (n_l, n_e) = (lfp.n_samples(), external.n_samples());

    let report = match policy {
        CropPolicy::Both { pre_roll_secs } => {
            let (lfp_start, lfp_clamped) = start_index(art_time_lfp - pre_roll_secs, sf_l, n_l);
            let (ext_start, ext_clamped) =
                start_index(art_time_external - pre_roll_secs, sf_e, n_e);
            let (lfp_len, ext_len) = equalize(n_l - lfp_start, sf_l, n_e - ext_start, sf_e);
            CropReport {
                lfp_start,
                lfp_len,
                external_start: ext_start,
                external_len: ext_len,
                lfp_start_clamped: lfp_clamped,
                external_start_clamped: ext_clamped,
                duration_secs: lfp_len as f64 / sf_l as f64,
            }
        }
        CropPolicy::ExternalOnly => {
            let (ext_start, ext_clamped) =
                start_index(art_time_external - art_time_lfp, sf_e, n_e);
            let ext_len = (n_e - ext_start).min(rescale(n_l, sf_l, sf_e));
            CropReport {
                lfp_start: 0,
                lfp_len: n_l,
                external_start: ext_start,
                external_len: ext_len,
                lfp_start_clamped: false,
                external_start_clamped: ext_clamped,
                duration_secs: n_l as f64 / sf_l as f64,
            }
        }
    };

    for msg in report.warnings() {
        warn!("{msg}");
    }
    info!(
        ?policy,
        lfp_start = report.lfp_start,
        lfp_len = report.lfp_len,
        external_start = report.external_start,
        external_len = report.external_len,
        "recordings synchronized"
    );

    let lfp_out = match policy {
        CropPolicy::ExternalOnly => lfp.clone(),
        CropPolicy::Both { .. } => lfp.crop(report.lfp_start, report.lfp_len),
    };
    let ext_out = external.crop(report.external_start, report.external_len);
    SyncedPair { lfp: lfp_out, external: ext_out, report }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// `round(t × sfreq)` clamped to `[0, n]`, plus whether clamping happened.
fn start_index(t: f64, sfreq: u32, n: usize) -> (usize, bool) {
    let raw = (t * sfreq as f64).round();
    if raw < 0.0 {
        (0, true)
    } else if raw > n as f64 {
        (n, true)
    } else {
        (raw as usize, false)
    }
}

/// Number of samples at `sf_to` spanning `len` samples at `sf_from`, rounded.
fn rescale(len: usize, sf_from: u32, sf_to: u32) -> usize {
    let (len, from, to) = (len as u128, sf_from as u128, sf_to as u128);
    ((2 * len * to + from) / (2 * from)) as usize
}

/// Truncate the longer of two spans so both cover the same duration.
fn equalize(len_l: usize, sf_l: u32, len_e: usize, sf_e: u32) -> (usize, usize) {
    let dur_l = len_l as u128 * sf_e as u128;
    let dur_e = len_e as u128 * sf_l as u128;
    if dur_l > dur_e {
        (len_l.min(rescale(len_e, sf_e, sf_l)), len_e)
    } else {
        (len_l, len_e.min(rescale(len_l, sf_l, sf_e)))
    }
}
