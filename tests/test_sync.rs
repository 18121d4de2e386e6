mod common;
use common::recording;
use resync::{synchronize, CropPolicy, Recording};

const BOTH: CropPolicy = CropPolicy::Both { pre_roll_secs: 1.0 };

/// Channel 0 holds the sample index, so values identify original positions.
fn indexed(n: usize, sfreq: u32, n_ch: usize) -> Recording {
    let idx: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let names: Vec<String> = (0..n_ch).map(|c| format!("ch{c}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    recording(&idx, n_ch - 1, sfreq, &names)
}

fn anchors() -> Vec<(f64, f64)> {
    vec![(2.0, 2.3), (1.0, 1.0), (3.5, 1.25), (1.001, 4.75), (2.25, 2.002)]
}

// ── crop_both ────────────────────────────────────────────────────────────────

#[test]
fn durations_match_within_one_sample() {
    for (sf_l, sf_e) in [(1000, 500), (250, 4096), (512, 2048), (1000, 1000)] {
        let lfp = indexed(20 * sf_l as usize, sf_l, 2);
        let ext = indexed(17 * sf_e as usize, sf_e, 3);
        for (t_l, t_e) in anchors() {
            let pair = synchronize(&lfp, &ext, t_l, t_e, BOTH);
            let d = (pair.lfp.duration_secs() - pair.external.duration_secs()).abs();
            let period = 1.0 / sf_l.min(sf_e) as f64;
            assert!(d <= period, "sf {sf_l}/{sf_e}, anchors {t_l}/{t_e}: Δ = {d}");
        }
    }
}

#[test]
fn anchors_sit_one_second_in() {
    for (sf_l, sf_e) in [(1000, 500), (250, 4096)] {
        let lfp = indexed(20 * sf_l as usize, sf_l, 1);
        let ext = indexed(20 * sf_e as usize, sf_e, 1);
        for (t_l, t_e) in anchors() {
            let pair = synchronize(&lfp, &ext, t_l, t_e, BOTH);
            let l = pair.lfp.data()[[0, sf_l as usize]];
            let e = pair.external.data()[[0, sf_e as usize]];
            assert_eq!(l, (t_l * sf_l as f64).round(), "lfp anchor for {t_l}");
            assert_eq!(e, (t_e * sf_e as f64).round(), "external anchor for {t_e}");
        }
    }
}

#[test]
fn channels_and_rates_preserved() {
    let lfp = indexed(10_000, 1000, 2);
    let ext = indexed(8_000, 500, 4);
    let pair = synchronize(&lfp, &ext, 2.0, 2.3, BOTH);
    assert_eq!(pair.lfp.ch_names(), lfp.ch_names());
    assert_eq!(pair.external.ch_names(), ext.ch_names());
    assert_eq!(pair.lfp.sfreq(), 1000);
    assert_eq!(pair.external.sfreq(), 500);
    // Extra channels are cut at the same columns as the reference channel.
    assert_eq!(pair.external.data()[[3, 0]], 3_000_000.0 + 650.0);
}

#[test]
fn second_pass_never_grows() {
    let lfp = indexed(15_000, 1000, 1);
    let ext = indexed(9_000, 512, 1);
    for (t_l, t_e) in anchors() {
        let first = synchronize(&lfp, &ext, t_l, t_e, BOTH);
        let second = synchronize(&first.lfp, &first.external, 0.0, 0.0, BOTH);
        assert!(second.lfp.n_samples() <= first.lfp.n_samples());
        assert!(second.external.n_samples() <= first.external.n_samples());
        assert!(second.report.lfp_start_clamped && second.report.external_start_clamped);
    }
}

// ── crop_both = false ────────────────────────────────────────────────────────

#[test]
fn reference_recording_untouched() {
    let lfp = indexed(12_000, 1000, 2);
    let ext = indexed(9_000, 500, 2);
    for (t_l, t_e) in anchors().into_iter().filter(|(l, e)| e >= l) {
        let pair = synchronize(&lfp, &ext, t_l, t_e, CropPolicy::ExternalOnly);
        assert_eq!(pair.lfp, lfp);

        // External anchor lands at the intracranial anchor's wall-clock time.
        let at = (t_l * 500.0).round() as usize;
        let expected = (t_e * 500.0).round();
        assert!((pair.external.data()[[0, at]] - expected).abs() <= 1.0);
        assert!(pair.external.duration_secs() <= pair.lfp.duration_secs());
    }
}
