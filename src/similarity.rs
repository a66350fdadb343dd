use std::collections::HashMap;

/// Approximate, one-sided upper bound on LCS character-overlap ratio, in the
/// spirit of `difflib`'s `quick_ratio`: a full LCS is O(n^2) and prohibitive
/// at the scale this engine runs at, so this multiset-overlap bound is used
/// instead. It never under-estimates similarity, so it is safe against
/// false rejection of genuine wildcard responses — the cost is occasional
/// false acceptance on short or repetitive bodies.
///
/// Bodies of equal length short-circuit to `1.0`: the source tool treats an
/// exact length match as conclusive without doing the character comparison.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.len() == b.len() {
        return 1.0;
    }
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let ratio = quick_ratio(a.as_bytes(), b.as_bytes());
    (ratio * 1000.0).round() / 1000.0
}

fn quick_ratio(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut full_count: HashMap<u8, i64> = HashMap::new();
    for &byte in b {
        *full_count.entry(byte).or_insert(0) += 1;
    }

    let mut avail: HashMap<u8, i64> = HashMap::new();
    let mut matches: i64 = 0;
    for &byte in a {
        let remaining = *avail
            .entry(byte)
            .or_insert_with(|| *full_count.get(&byte).unwrap_or(&0));
        avail.insert(byte, remaining - 1);
        if remaining > 0 {
            matches += 1;
        }
    }

    2.0 * matches as f64 / (a.len() + b.len()) as f64
}
