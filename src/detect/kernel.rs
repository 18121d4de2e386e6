//! Matched-filter templates for the intracranial stimulation artifact.
//!
//! Kernel 1 `[1, -1]` responds to any steep decrease. Kernel 2
//! `[1, 0, -1] ++ linspace(-1, 0, 20)` also matches the slow recovery that
//! follows the onset of a stimulation artifact, and is the better choice on
//! most recordings.
use serde::{Deserialize, Serialize};

/// Matched-filter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kernel {
    /// `[1, -1]`
    Edge,
    /// `[1, 0, -1, linspace(-1, 0, 20)...]`, 23 taps.
    EdgeRecovery,
}

impl Kernel {
    pub fn taps(self) -> Vec<f64> {
        match self {
            Kernel::Edge => vec![1.0, -1.0],
            Kernel::EdgeRecovery => {
                let mut taps = vec![1.0, 0.0, -1.0];
                taps.extend((0..20).map(|i| -1.0 + i as f64 / 19.0));
                taps
            }
        }
    }
}

/// Sliding dot product of `taps` against every window of `signal`.
///
/// `res[i] = taps · signal[i .. i + taps.len()]` for
/// `i in 0 .. signal.len() - taps.len()`; the final full window is not
/// scored. Returns an empty vector when the signal is not longer than the
/// template.
pub fn kernel_response(signal: &[f64], taps: &[f64]) -> Vec<f64> {
    let k = taps.len();
    if k == 0 || signal.len() <= k {
        return vec![];
    }
    (0..signal.len() - k)
        .map(|i| {
            signal[i..i + k]
                .iter()
                .zip(taps)
                .map(|(x, t)| x * t)
                .sum()
        })
        .collect()
}
