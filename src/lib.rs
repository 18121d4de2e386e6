//! # resync — align intracranial LFP and external recordings on DBS artifacts
//!
//! `resync` co-registers two independently clocked recordings of the same
//! session: an intracranial local field potential (LFP) recording and an
//! external EEG/ECG rig. Both contain a train of deep-brain-stimulation
//! onset artifacts; the first artifact of each train is the shared zero-time
//! anchor.
//!
//! ## Pipeline overview
//!
//! ```text
//! lfp [C, T] @ sf_lfp             external [C, T] @ sf_ext
//!   │                               │
//!   │                               ├─ detrend        1st-order Butterworth HP, filtfilt
//!   │                               └─ detect         fixed threshold, polarity-aware
//!   ├─ detect   kernel 2 → kernel 1 → manual           (priority list)
//!   │     └─ Reviewer gate          accept? y/n, reject ⇒ next method
//!   │
//!   └──────────────┬────────────────┘
//!                  ├─ synchronize    crop 1 s before both anchors, equal duration
//!                  │                 (or keep the LFP untouched, shift the external)
//!                  └─ timeshift      optional drift at a late artifact pair
//!                        │
//!                        └─→ (SyncedPair, SyncRecord)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use resync::{resync, AcceptAll, Recording, ScriptedPicker, SessionInput, SyncConfig, ReviewMode};
//! use ndarray::Array2;
//!
//! let lfp = Recording::new(Array2::zeros((2, 60_000)), vec!["L".into(), "R".into()], 250).unwrap();
//! let ext = Recording::new(Array2::zeros((3, 240_000)), vec!["BIP 01".into(), "ECG".into(), "EMG".into()], 4096).unwrap();
//!
//! let input = SessionInput {
//!     session_id: "sub-01",
//!     lfp: &lfp,
//!     lfp_channel: 0,
//!     external: &ext,
//!     external_channel: ext.channel_index("BIP 01").unwrap(),
//! };
//! let cfg = SyncConfig { mode: ReviewMode::Automated, ..SyncConfig::default() };
//! let (pair, record) = resync(&input, &cfg, &mut ScriptedPicker::empty(), &mut AcceptAll).unwrap();
//!
//! println!("{}", record.to_json().unwrap());
//! println!("synced duration: {:.3} s", pair.lfp.duration_secs());
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use resync::{detrend, find_external_artifact, find_kernel_artifacts, synchronize};
//! use resync::{CropPolicy, ExternalParams, Kernel, KernelParams, Recording};
//! # let lfp: Recording = unimplemented!();
//! # let ext: Recording = unimplemented!();
//!
//! let bip = detrend(&ext.channel_vec(0).unwrap()).unwrap();
//! let t_ext = find_external_artifact(&bip, ext.sfreq(), &ExternalParams::default()).unwrap();
//!
//! let det = find_kernel_artifacts(
//!     &lfp.channel_vec(0).unwrap(),
//!     lfp.sfreq(),
//!     Kernel::EdgeRecovery,
//!     &KernelParams::default(),
//! ).unwrap();
//! let t_lfp = det.first() as f64 / lfp.sfreq() as f64;
//!
//! let pair = synchronize(&lfp, &ext, t_lfp, t_ext, CropPolicy::Both { pre_roll_secs: 1.0 });
//! assert_eq!(pair.lfp.ch_names(), lfp.ch_names());
//! ```

pub mod config;
pub mod detect;
pub mod detrend;
pub mod error;
pub mod filter;
pub mod io;
pub mod manual;
pub mod peaks;
pub mod record;
pub mod recording;
pub mod stats;
pub mod sync;
pub mod timeshift;

use tracing::{debug, info, warn};

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{ExternalParams, KernelParams, ReviewMode, SyncConfig, ThresholdParams};

// detect
pub use detect::{
    find_external_artifact, find_intracranial_artifact, find_kernel_artifacts,
    find_threshold_artifact, kernel_response, reject_amplitude_outliers,
    Detection, ExternalMethod, IntracranialMethod, Kernel,
};

// detrend + filter
pub use detrend::{detrend, detrend_with_cutoff, DETREND_CUTOFF};
pub use filter::{butter_highpass, filtfilt, lfilter, lfilter_zi, IirCoeffs};

// errors
pub use error::{Result, Side, SyncError};

// io — safetensors helpers
pub use io::{write_synced_pair, StWriter};

// manual selection capability
pub use manual::{
    manual_select, snap_to_sample, AcceptAll, ManualPicker, PickRequest, Review, Reviewer,
    ScriptedPicker, ScriptedReviewer,
};

// peaks
pub use peaks::{find_peaks, width_above, width_below};

// record + recording
pub use record::{SessionInput, SyncRecord};
pub use recording::Recording;

// sync
pub use sync::{synchronize, CropPolicy, CropReport, SyncedPair};

// timeshift
pub use timeshift::{estimate_timeshift, measure_timeshift, TimeshiftMeasurement, TimeshiftOptions};

/// Run the **full synchronization pipeline** on one session.
///
/// # Steps
///
/// 1. Detrend the external reference channel
///    ([`SyncConfig::detrend_cutoff`]) and find its first artifact. In
///    [`ReviewMode::Interactive`] the anchor goes through
///    [`Reviewer::confirm_external`]; a rejection or a failed search falls
///    back to a manual pick.
/// 2. Try the intracranial methods of [`SyncConfig::methods`] in order.
///    Interactive runs show every result to `reviewer`; a rejection moves on
///    to the next method. Automated runs skip [`IntracranialMethod::Manual`]
///    and accept the first method that yields a candidate.
/// 3. Crop both recordings with [`CropPolicy::from_config`].
///
/// The returned [`SyncRecord`] has no timeshift; attach one with
/// [`SyncRecord::set_timeshift`].
///
/// # Errors
///
/// * [`SyncError::NoArtifactFound`] in automated mode when no detector finds
///   a candidate (the last detector failure is returned).
/// * [`SyncError::Rejected`] in interactive mode when every method was turned
///   down or failed.
/// * [`SyncError::InvalidConfig`] when [`SyncConfig::validate`] fails.
/// * [`SyncError::SignalTooShort`] when the external reference channel is too
///   short to detrend.
/// * [`SyncError::EmptySelection`] when a manual pick is confirmed empty.
pub fn resync(
    input: &SessionInput<'_>,
    cfg: &SyncConfig,
    picker: &mut dyn ManualPicker,
    reviewer: &mut dyn Reviewer,
) -> Result<(SyncedPair, SyncRecord)> {
    cfg.validate()?;
    let interactive = cfg.mode == ReviewMode::Interactive;
    let (sf_lfp, sf_ext) = (input.lfp.sfreq(), input.external.sfreq());
    info!(session = input.session_id, mode = ?cfg.mode, "starting synchronization");

    let lfp_sig = input.lfp.channel_vec(input.lfp_channel)?;
    let ext_raw = input.external.channel_vec(input.external_channel)?;
    let ext_sig = detrend_with_cutoff(&ext_raw, cfg.detrend_cutoff)?;

    // 1. External anchor.
    let detected = match find_external_artifact(&ext_sig, sf_ext, &cfg.external) {
        Ok(t) if interactive && !reviewer.confirm_external(t)? => {
            info!(time = t, "external detection rejected");
            None
        }
        Ok(t) => Some(t),
        Err(e @ SyncError::NoArtifactFound { .. }) if interactive => {
            warn!("{e}, falling back to manual selection");
            None
        }
        Err(e) => return Err(e),
    };
    let (art_time_external, external_method) = match detected {
        Some(t) => (t, ExternalMethod::FixedThreshold(cfg.external.clone())),
        None => {
            let t = manual_select(
                picker,
                Side::External,
                &ext_sig,
                sf_ext,
                "select the last sample before the first artifact deflection",
            )?;
            (t, ExternalMethod::Manual)
        }
    };

    // 2. Intracranial anchor.
    let accepted = select_intracranial(&lfp_sig, sf_lfp, art_time_external, cfg, picker, reviewer)?;
    let art_time_lfp = accepted.detection.first() as f64 / sf_lfp as f64;

    let mut warnings = vec![];
    if let Some(ratio) = accepted.detection.confidence_ratio.filter(|_| accepted.detection.low_confidence) {
        warnings.push(format!(
            "artifact-train confidence ratio {ratio:.2} is low, \
             the intracranial recording may hold no stimulation artifacts"
        ));
    }

    // 3. Crop.
    let pair = synchronize(
        input.lfp,
        input.external,
        art_time_lfp,
        art_time_external,
        CropPolicy::from_config(cfg),
    );
    warnings.extend(pair.report.warnings());

    let record = SyncRecord {
        session_id: input.session_id.to_string(),
        art_time_lfp,
        art_time_external,
        art_time_lfp_automatic: accepted.automatic_time,
        lfp_corrected_by_user: matches!(accepted.method, IntracranialMethod::Manual),
        lfp_method: accepted.method,
        external_corrected_by_user: matches!(external_method, ExternalMethod::Manual),
        external_method,
        lfp_inverted: accepted.detection.inverted,
        confidence_ratio: accepted.detection.confidence_ratio,
        crop_both: cfg.crop_both,
        crop: pair.report.clone(),
        timeshift: None,
        warnings,
    };
    info!(
        session = input.session_id,
        art_time_lfp,
        art_time_external,
        method = %record.lfp_method,
        "synchronization done"
    );
    Ok((pair, record))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Accepted {
    method: IntracranialMethod,
    detection: Detection,
    /// First automated anchor turned down before a manual pick was accepted.
    automatic_time: Option<f64>,
}

/// Walk the method priority list until a detection is accepted.
fn select_intracranial(
    signal: &[f64],
    sfreq: u32,
    art_time_external: f64,
    cfg: &SyncConfig,
    picker: &mut dyn ManualPicker,
    reviewer: &mut dyn Reviewer,
) -> Result<Accepted> {
    let interactive = cfg.mode == ReviewMode::Interactive;
    let mut last_err = None;
    let mut automatic_time = None;

    for method in &cfg.methods {
        let is_manual = matches!(method, IntracranialMethod::Manual);
        if is_manual && !interactive {
            debug!("automated run, skipping manual method");
            continue;
        }
        info!(%method, "running intracranial detection");

        let detection = match find_intracranial_artifact(signal, sfreq, method, picker) {
            Ok(det) => det,
            Err(e @ SyncError::NoArtifactFound { .. }) => {
                warn!("{e}");
                last_err = Some(e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let time = detection.first() as f64 / sfreq as f64;

        if interactive {
            let candidates: Vec<f64> =
                detection.candidates.iter().map(|&i| i as f64 / sfreq as f64).collect();
            let review = Review {
                lfp_method: method,
                art_time_lfp: time,
                art_time_external,
                lfp_candidates: &candidates,
            };
            if !reviewer.confirm(&review)? {
                info!(%method, time, "detection rejected");
                if !is_manual {
                    automatic_time.get_or_insert(time);
                }
                continue;
            }
        }

        return Ok(Accepted {
            method: method.clone(),
            detection,
            automatic_time: if is_manual { automatic_time } else { None },
        });
    }

    Err(match last_err {
        Some(e) if !interactive => e,
        _ => SyncError::Rejected(Side::Intracranial),
    })
}
