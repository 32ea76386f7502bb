//! Moving-median filtering with reflect boundaries.
//!
//! The filter slides an odd-length window over the signal. Beyond either end
//! the signal is mirrored including the edge sample (`d c b a | a b c d | d c b a`),
//! so the output has the same length as the input.
//!
//! The window is kept as a sorted buffer: each step removes the outgoing sample
//! and inserts the incoming one by binary search, which keeps long windows
//! (thousands of bins) tractable on long spectra.

/// Convert a window width in physical units to an odd window length in bins.
///
/// `floor(width / spacing)`, bumped to the next odd integer when even, and at
/// least 1.
pub fn odd_window_len(width: f64, spacing: f64) -> usize {
    let raw = width / spacing;
    let mut len = if raw.is_finite() && raw > 0.0 { raw.floor() as usize } else { 1 };
    if len % 2 == 0 {
        len += 1;
    }
    len.max(1)
}

/// Map an out-of-range index onto `[0, n)` by mirror reflection.
fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let mut k = i.rem_euclid(period);
    if k >= n {
        k = period - 1 - k;
    }
    k as usize
}

/// Moving median with an odd window length (even lengths are bumped by one).
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let window = if window % 2 == 0 { window + 1 } else { window };
    if window <= 1 {
        return values.to_vec();
    }
    let half = (window / 2) as isize;
    let at = |i: isize| values[reflect_index(i, n)];

    let mut sorted: Vec<f64> = (-half..=half).map(at).collect();
    sorted.sort_by(f64::total_cmp);

    let mut out = Vec::with_capacity(n);
    out.push(sorted[window / 2]);

    for i in 1..n as isize {
        let outgoing = at(i - 1 - half);
        let incoming = at(i + half);

        if let Ok(pos) = sorted.binary_search_by(|v| v.total_cmp(&outgoing)) {
            sorted.remove(pos);
        }
        let pos = sorted
            .binary_search_by(|v| v.total_cmp(&incoming))
            .unwrap_or_else(|p| p);
        sorted.insert(pos, incoming);

        out.push(sorted[window / 2]);
    }

    out
}
