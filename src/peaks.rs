//! Peak picking on matched-filter responses.
//!
//! `find_peaks` follows `scipy.signal.find_peaks(x, height=h, distance=d)`:
//!   1. strict local maxima; a flat plateau counts once, at its midpoint
//!      (rounded down),
//!   2. drop peaks lower than `height`,
//!   3. walking from the highest peak down, drop every neighbour closer than
//!      `distance` samples to a peak that is still kept.

/// Indices of the local maxima of `x` that pass `height` and `distance`.
///
/// Returned in ascending index order. `distance` is clamped to at least 1.
pub fn find_peaks(x: &[f64], height: f64, distance: usize) -> Vec<usize> {
    let peaks: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&i| x[i] >= height)
        .collect();
    select_by_distance(x, &peaks, distance.max(1))
}

/// Number of consecutive samples from `start` with `x > level`.
pub fn width_above(x: &[f64], start: usize, level: f64) -> usize {
    x.iter().skip(start).take_while(|&&v| v > level).count()
}

/// Number of consecutive samples from `start` with `x < level`.
pub fn width_below(x: &[f64], start: usize, level: f64) -> usize {
    x.iter().skip(start).take_while(|&&v| v < level).count()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Matches scipy's `_local_maxima_1d`.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut out = Vec::new();
    if n < 3 {
        return out;
    }
    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                out.push((left + right) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Matches scipy's `_select_by_peak_distance` (priority = peak height).
fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];

    // Ascending height; iterate from the back so the tallest peak wins.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks.iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
