/// Shared synthetic-recording builders.
use ndarray::Array2;
use resync::Recording;

/// Square-edge artifact train: `width` samples at `-depth` starting at each
/// onset, flat elsewhere.
#[allow(unused)]
pub fn square_train(n: usize, onsets: &[usize], width: usize, depth: f64) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for &p in onsets {
        x[p..p + width].iter_mut().for_each(|v| *v = -depth);
    }
    x
}

/// Low-level oscillation with short three-sample downward spikes.
#[allow(unused)]
pub fn spike_train(n: usize, onsets: &[usize], depth: f64) -> Vec<f64> {
    let mut x: Vec<f64> = (0..n).map(|i| 0.01 * (i as f64 * 0.37).sin()).collect();
    for &p in onsets {
        x[p] = -depth;
        x[p + 1] = -depth / 2.0;
        x[p + 2] = -depth / 4.0;
    }
    x
}

/// Onsets of a 1 Hz train starting at `start_secs`, `count` pulses.
#[allow(unused)]
pub fn onsets(start_secs: f64, count: usize, sfreq: u32) -> Vec<usize> {
    (0..count)
        .map(|k| ((start_secs + k as f64) * sfreq as f64).round() as usize)
        .collect()
}

/// Recording whose channel 0 is `reference`; extra channels hold the sample
/// index scaled by the channel number so crops can be traced.
#[allow(unused)]
pub fn recording(reference: &[f64], extra: usize, sfreq: u32, names: &[&str]) -> Recording {
    let n = reference.len();
    let data = Array2::from_shape_fn((extra + 1, n), |(c, t)| {
        if c == 0 { reference[t] } else { (c * 1_000_000 + t) as f64 }
    });
    Recording::new(data, names.iter().map(|s| s.to_string()).collect(), sfreq).unwrap()
}

/// 10 s intracranial recording at 1 kHz, square train from 2.0 s every 1 s.
#[allow(unused)]
pub fn lfp_session() -> Recording {
    let x = square_train(10_000, &onsets(2.0, 8, 1000), 5, 100.0);
    recording(&x, 1, 1000, &["LFP_L", "LFP_R"])
}

/// 12 s external recording at 500 Hz, same train from 2.3 s, inverted.
#[allow(unused)]
pub fn external_session() -> Recording {
    let x: Vec<f64> = spike_train(6_000, &onsets(2.3, 8, 500), 1.0)
        .iter()
        .map(|v| -v)
        .collect();
    recording(&x, 2, 500, &["BIP 01", "ECG", "EMG"])
}
