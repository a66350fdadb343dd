use std::collections::HashSet;

use crate::model::is_domain;

/// Cartesian product of a label set and a single parent domain, with
/// syntactic filtering and deduplication. The parent itself is always
/// included first. Output is deduplicated but deliberately not sorted —
/// the work queue consumes in LIFO order regardless of generation order.
pub fn generate(parent: &str, labels: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(labels.len() + 1);
    let mut out = Vec::with_capacity(labels.len() + 1);

    seen.insert(parent.to_string());
    out.push(parent.to_string());

    for label in labels {
        let candidate = format!("{label}.{parent}");
        if is_domain(&candidate) && seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    out
}
