//! Token-set fuzzy similarity scoring.
//!
//! Scores are on a 0-100 scale. The comparison is order-insensitive: both
//! strings are lowercased, split into alphanumeric tokens, and compared as
//! sorted token sets (intersection against each remainder), with
//! normalized Levenshtein similarity as the underlying string measure.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Lowercase and collapse a string to space-separated alphanumeric tokens.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Token-set similarity ratio between two strings, 0-100.
///
/// Identical token sets score 100 regardless of order or duplication;
/// a query that is a token-subset of the target also scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }

    let set_a: BTreeSet<&str> = na.split(' ').collect();
    let set_b: BTreeSet<&str> = nb.split(' ').collect();

    let intersection: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let diff_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let diff_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let sect = intersection.join(" ");
    let combined_a = join_nonempty(&sect, &diff_a.join(" "));
    let combined_b = join_nonempty(&sect, &diff_b.join(" "));

    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Whether two strings match at or above the given cutoff score.
pub fn matches_cutoff(a: &str, b: &str, cutoff: u8) -> bool {
    token_set_ratio(a, b) >= cutoff as f64
}
