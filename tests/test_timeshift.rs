mod common;
use common::{lfp_session, recording, spike_train};
use approx::assert_abs_diff_eq;
use resync::{
    estimate_timeshift, measure_timeshift, resync, AcceptAll, ReviewMode, ScriptedPicker,
    SessionInput, SyncConfig, SyncedPair, SyncRecord, TimeshiftOptions,
};

/// External train whose period runs `drift_ms` per pulse slow.
fn drifting_external(drift_ms: f64) -> resync::Recording {
    let onsets: Vec<usize> = (0..8)
        .map(|k| ((2.3 + k as f64 * (1.0 + drift_ms / 1000.0)) * 500.0).round() as usize)
        .collect();
    let x: Vec<f64> = spike_train(6_000, &onsets, 1.0).iter().map(|v| -v).collect();
    recording(&x, 0, 500, &["BIP 01"])
}

fn synced(drift_ms: f64) -> (SyncedPair, SyncRecord) {
    let lfp = lfp_session();
    let ext = drifting_external(drift_ms);
    let input = SessionInput { session_id: "drift", lfp: &lfp, lfp_channel: 0, external: &ext, external_channel: 0 };
    let cfg = SyncConfig { mode: ReviewMode::Automated, ..SyncConfig::default() };
    resync(&input, &cfg, &mut ScriptedPicker::empty(), &mut AcceptAll).unwrap()
}

#[test]
fn estimate_without_drift() {
    let (pair, _) = synced(0.0);
    let m = estimate_timeshift(&pair.lfp, 0, &pair.external, 0, &TimeshiftOptions::default()).unwrap();
    assert_abs_diff_eq!(m.timeshift_ms, 0.0, epsilon = 4.0);
    assert!(!m.suspicious);
}

#[test]
fn estimate_tracks_drift() {
    let (pair, _) = synced(1.0);
    let m = estimate_timeshift(&pair.lfp, 0, &pair.external, 0, &TimeshiftOptions::default()).unwrap();
    // Seven periods of 1 ms drift at the last artifact.
    assert_abs_diff_eq!(m.timeshift_ms, 7.0, epsilon = 4.0);
    assert_abs_diff_eq!(m.reference_secs, 8.0, epsilon = 0.02);
}

#[test]
fn manual_measurement_on_synced_pair() {
    let (pair, mut record) = synced(0.0);
    let mut picker = ScriptedPicker::new(vec![vec![8.0], vec![8.15]]);
    let m = measure_timeshift(&pair.lfp, 0, &pair.external, 0, &mut picker, &TimeshiftOptions::default())
        .unwrap();
    assert_abs_diff_eq!(m.timeshift_ms, 150.0, epsilon = 1e-6);
    assert!(m.suspicious);

    record.set_timeshift(m);
    assert!(record.timeshift.is_some());
    assert!(record.warnings.iter().any(|w| w.contains("packet loss")));
}
