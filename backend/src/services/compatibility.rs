use std::collections::BTreeSet;

use crate::constants::{INTEREST_WEIGHT, VALUES_WEIGHT};
use crate::models::UserProfile;

/// Lowercased, trimmed, deduplicated set of profile entries
pub fn normalize(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Jaccard overlap of two sets; two empty sets share nothing.
fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Deterministic, symmetric 0..=100 score from shared interests, values and
/// what both people are looking for. Only used for ranking and display.
pub fn compute_score(a: &UserProfile, b: &UserProfile) -> i32 {
    let interests = overlap(&normalize(&a.interests), &normalize(&b.interests));
    let values = overlap(&normalize(&a.values), &normalize(&b.values));
    let looking_for = overlap(&normalize(&a.looking_for), &normalize(&b.looking_for));

    let score = INTEREST_WEIGHT * interests + VALUES_WEIGHT * (values + looking_for) / 2.0;
    (score * 100.0).round().clamp(0.0, 100.0) as i32
}
