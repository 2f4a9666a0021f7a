//! Built-in reducers
//!
//! Every function here is pure and treats its input as an unordered multiset.
//! All of them return `0.0` for an empty slice, so a reduction never fails on
//! an empty series; callers that need to tell an empty series apart from a real
//! zero reading should look at the sample count.

/// Smallest sample, or `0.0` when empty
pub fn min(samples: &[f64]) -> f64 {
    let Some((&first, rest)) = samples.split_first() else {
        return 0.0;
    };
    rest.iter().fold(first, |acc, &v| if v < acc { v } else { acc })
}

/// Largest sample, or `0.0` when empty
pub fn max(samples: &[f64]) -> f64 {
    let Some((&first, rest)) = samples.split_first() else {
        return 0.0;
    };
    rest.iter().fold(first, |acc, &v| if v > acc { v } else { acc })
}

/// Arithmetic mean, or `0.0` when empty
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f64 = samples.iter().sum();
    if sum.is_finite() {
        return sum / samples.len() as f64;
    }

    // The plain sum overflowed; a running mean stays within the sample range
    samples
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, &v)| acc + (v - acc) / (i + 1) as f64)
}

/// Empirical quantile at probability `q` (clamped to `[0, 1]`)
///
/// Works on a sorted copy, so the caller's slice is left untouched. The value
/// is linearly interpolated between the order statistics around the 0-indexed
/// rank `q * (n - 1)`.
pub fn quantile(samples: &[f64], q: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Same as [`quantile`] for input that is already sorted ascending
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    if fraction == 0.0 {
        return sorted[lower];
    }
    // Weighted form: the difference of two large samples may overflow
    sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
}

/// Median (50th percentile)
pub fn median(samples: &[f64]) -> f64 {
    quantile(samples, 0.5)
}

/// 90th percentile
pub fn p90(samples: &[f64]) -> f64 {
    quantile(samples, 0.90)
}

/// 95th percentile
pub fn p95(samples: &[f64]) -> f64 {
    quantile(samples, 0.95)
}

/// 99th percentile
pub fn p99(samples: &[f64]) -> f64 {
    quantile(samples, 0.99)
}
