mod common;
use common::{external_session, lfp_session, onsets, spike_train, square_train};
use approx::assert_abs_diff_eq;
use resync::detect::external::find_external_artifact_index;
use resync::{
    detrend, find_external_artifact, find_intracranial_artifact, find_kernel_artifacts,
    ExternalParams, IntracranialMethod, Kernel, KernelParams, ScriptedPicker, Side, SyncError,
};

// ── External detector ────────────────────────────────────────────────────────

#[test]
fn external_polarity_invariance() {
    let x = detrend(&spike_train(6_000, &onsets(2.3, 8, 500), 1.0)).unwrap();
    let flipped: Vec<f64> = x.iter().map(|v| -v).collect();
    let params = ExternalParams::default();

    let a = find_external_artifact(&x, 500, &params).unwrap();
    let b = find_external_artifact(&flipped, 500, &params).unwrap();
    assert_eq!(a, b);
    assert_abs_diff_eq!(a, 2.3, epsilon = 1.0 / 500.0);
}

#[test]
fn external_session_anchor() {
    let ext = external_session();
    let bip = detrend(&ext.channel_vec(0).unwrap()).unwrap();
    let t = find_external_artifact(&bip, ext.sfreq(), &ExternalParams::default()).unwrap();
    assert_abs_diff_eq!(t, 2.3, epsilon = 1.0 / 500.0);
}

#[test]
fn external_start_index_moves_scan() {
    let x = detrend(&spike_train(6_000, &onsets(2.3, 8, 500), 1.0)).unwrap();
    let params = ExternalParams { start_index: 1200, ..ExternalParams::default() };
    let idx = find_external_artifact_index(&x, 500, &params).unwrap();
    assert_eq!(idx, 1650);
}

#[test]
fn external_scan_past_end_fails_closed() {
    let x = detrend(&spike_train(6_000, &[], 1.0)).unwrap();
    let err = find_external_artifact(&x, 500, &ExternalParams::default()).unwrap_err();
    assert!(matches!(err, SyncError::NoArtifactFound { side: Side::External, .. }));
}

// ── Kernel detectors ─────────────────────────────────────────────────────────

#[test]
fn kernel2_concrete_scenario() {
    let lfp = lfp_session();
    let det = find_kernel_artifacts(
        &lfp.channel_vec(0).unwrap(),
        lfp.sfreq(),
        Kernel::EdgeRecovery,
        &KernelParams::default(),
    )
    .unwrap();
    assert!(det.first().abs_diff(2000) <= 2, "first = {}", det.first());
    assert_eq!(det.candidates.len(), 8);
}

#[test]
fn kernels_are_deterministic() {
    let x = lfp_session().channel_vec(0).unwrap();
    for kernel in [Kernel::Edge, Kernel::EdgeRecovery] {
        let a = find_kernel_artifacts(&x, 1000, kernel, &KernelParams::default()).unwrap();
        let b = find_kernel_artifacts(&x, 1000, kernel, &KernelParams::default()).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn amplitude_outlier_is_excluded() {
    let pulses = onsets(2.0, 10, 1000);
    let mut x = square_train(13_000, &pulses, 5, 100.0);
    // Sixth pulse at three times the common amplitude.
    x[pulses[5]..pulses[5] + 5].iter_mut().for_each(|v| *v = -300.0);

    let det = find_kernel_artifacts(&x, 1000, Kernel::EdgeRecovery, &KernelParams::default()).unwrap();
    assert_eq!(det.candidates.len(), 9);
    assert!(det.candidates.iter().all(|&c| c.abs_diff(pulses[5]) > 100));
}

#[test]
fn inverted_train_uses_negative_peaks() {
    let x: Vec<f64> = lfp_session().channel_vec(0).unwrap().iter().map(|v| -v).collect();
    let det = find_kernel_artifacts(&x, 1000, Kernel::EdgeRecovery, &KernelParams::default()).unwrap();
    assert!(det.inverted);
    assert!(det.first().abs_diff(2000) <= 2, "first = {}", det.first());
}

#[test]
fn dispatch_by_method() {
    let x = lfp_session().channel_vec(0).unwrap();
    let mut picker = ScriptedPicker::empty();
    for tag in ["1", "2"] {
        let method: IntracranialMethod = tag.parse().unwrap();
        let det = find_intracranial_artifact(&x, 1000, &method, &mut picker).unwrap();
        assert!(det.first().abs_diff(2000) <= 2, "method {tag}: {}", det.first());
    }
    // The empty picker was never consulted.
    assert_eq!(picker.remaining(), 0);
}
