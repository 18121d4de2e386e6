//! Per-session inputs and the provenance record of a synchronization run.
//!
//! A [`SyncRecord`] is an ordinary value owned by the caller. Nothing is
//! accumulated across sessions; serializing the record (the CLI writes
//! `parameters_<session>.json`) is the caller's choice.
use serde::{Deserialize, Serialize};

use crate::detect::{ExternalMethod, IntracranialMethod};
use crate::recording::Recording;
use crate::sync::CropReport;
use crate::timeshift::TimeshiftMeasurement;

/// One session to synchronize.
#[derive(Debug, Clone, Copy)]
pub struct SessionInput<'a> {
    pub session_id: &'a str,
    pub lfp: &'a Recording,
    /// Row of `lfp` carrying the stimulation artifacts.
    pub lfp_channel: usize,
    pub external: &'a Recording,
    /// Row of `external` carrying the stimulation artifacts (bipolar channel).
    pub external_channel: usize,
}

/// What was detected, how, and how the recordings were cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub session_id: String,
    /// Accepted intracranial anchor (s from the start of the raw recording).
    pub art_time_lfp: f64,
    /// Accepted external anchor (s from the start of the raw recording).
    pub art_time_external: f64,
    /// First automated intracranial candidate the operator turned down in
    /// favour of a manual pick, if any.
    pub art_time_lfp_automatic: Option<f64>,
    pub lfp_method: IntracranialMethod,
    pub external_method: ExternalMethod,
    pub lfp_corrected_by_user: bool,
    pub external_corrected_by_user: bool,
    /// Kernel detector judged the intracranial channel inverted.
    pub lfp_inverted: bool,
    /// Artifact-train confidence ratio of the accepted kernel detection.
    pub confidence_ratio: Option<f64>,
    pub crop_both: bool,
    pub crop: CropReport,
    pub timeshift: Option<TimeshiftMeasurement>,
    /// Suspicious-but-accepted conditions met during the run.
    pub warnings: Vec<String>,
}

impl SyncRecord {
    /// Attach a drift measurement, noting it when suspicious.
    pub fn set_timeshift(&mut self, m: TimeshiftMeasurement) {
        if m.suspicious {
            self.warnings.push(format!(
                "timeshift of {:.2} ms at {:.3} s, check for packet loss",
                m.timeshift_ms, m.reference_secs
            ));
        }
        self.timeshift = Some(m);
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
