use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::constants::{PROGRESS_WEIGHTS, weight_for};
use crate::models::ActivityCategory;

/// Common denominator of every category max, so the weighted sum stays exact.
fn denominator() -> i64 {
    PROGRESS_WEIGHTS.iter().map(|w| w.max_units as i64).product()
}

/// Weighted progress from the number of mutually completed keys per category.
///
/// `sum(min(completed, max) / max * weight)`, rounded down and clamped to 0..=100.
pub fn compute_progress(completed: &BTreeMap<ActivityCategory, i64>) -> i32 {
    let denom = denominator();
    let scaled: i64 = PROGRESS_WEIGHTS
        .iter()
        .map(|w| {
            let count = completed.get(&w.category).copied().unwrap_or(0).clamp(0, w.max_units as i64);
            count * w.weight as i64 * (denom / w.max_units as i64)
        })
        .sum();

    (scaled / denom).clamp(0, 100) as i32
}

/// Recompute from the full set of completed keys. Repeated keys count once.
pub fn progress_from_keys<'a, I>(completed_keys: I) -> i32
where
    I: IntoIterator<Item = (ActivityCategory, &'a str)>,
{
    let distinct: HashSet<(ActivityCategory, &str)> = completed_keys.into_iter().collect();
    let mut counts = BTreeMap::new();
    for (category, _) in distinct {
        *counts.entry(category).or_insert(0) += 1;
    }
    compute_progress(&counts)
}

/// Progress never moves backwards.
pub fn advance(previous: i32, recomputed: i32) -> i32 {
    previous.max(recomputed).clamp(0, 100)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub category: ActivityCategory,
    /// Keys both participants have completed
    pub completed: i64,
    pub max: i32,
    pub weight: i32,
    /// Keys the viewer has submitted
    pub mine: i64,
    /// Keys the partner has submitted
    pub theirs: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryCounts {
    pub completed: i64,
    pub mine: i64,
    pub theirs: i64,
}

pub fn category_breakdown(
    counts: &BTreeMap<ActivityCategory, CategoryCounts>,
) -> Vec<CategoryProgress> {
    ActivityCategory::ALL
        .iter()
        .map(|&category| {
            let weight = weight_for(category);
            let c = counts.get(&category).cloned().unwrap_or_default();
            CategoryProgress {
                category,
                completed: c.completed,
                max: weight.max_units,
                weight: weight.weight,
                mine: c.mine,
                theirs: c.theirs,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActivityCategory::*;

    fn counts(entries: &[(ActivityCategory, i64)]) -> BTreeMap<ActivityCategory, i64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_progress(&BTreeMap::new()), 0);
    }

    #[test]
    fn test_five_questions_reach_seventy() {
        assert_eq!(compute_progress(&counts(&[(Question, 5)])), 70);
        assert_eq!(compute_progress(&counts(&[(Question, 4)])), 56);
    }

    #[test]
    fn test_all_categories_full_is_one_hundred() {
        let full = counts(&[(Question, 5), (Photo, 3), (Voice, 2), (Game, 2), (Place, 1)]);
        assert_eq!(compute_progress(&full), 100);
    }

    #[test]
    fn test_category_is_capped_at_max() {
        assert_eq!(compute_progress(&counts(&[(Question, 50)])), 70);
        let over = counts(&[(Question, 9), (Photo, 9), (Voice, 9), (Game, 9), (Place, 9)]);
        assert_eq!(compute_progress(&over), 100);
    }

    #[test]
    fn test_rounds_down_exactly() {
        // 1 of 3 photos is 3.33
        assert_eq!(compute_progress(&counts(&[(Photo, 1)])), 3);
        assert_eq!(compute_progress(&counts(&[(Photo, 2)])), 6);
        // 3.33 + 2.5 = 5.83
        assert_eq!(compute_progress(&counts(&[(Photo, 1), (Game, 1)])), 5);
        // 5 questions + 2 photos + 1 voice = 70 + 6.67 + 5 = 81.67
        assert_eq!(compute_progress(&counts(&[(Question, 5), (Photo, 2), (Voice, 1)])), 81);
    }

    #[test]
    fn test_negative_counts_are_ignored() {
        assert_eq!(compute_progress(&counts(&[(Question, -3)])), 0);
    }

    #[test]
    fn test_recompute_is_idempotent_and_deduplicates() {
        let keys = vec![
            (Question, "values-1"),
            (Question, "values-2"),
            (Question, "values-1"),
            (Photo, "slot-1"),
        ];
        let first = progress_from_keys(keys.clone());
        let second = progress_from_keys(keys);
        assert_eq!(first, second);
        assert_eq!(first, 28 + 3);
    }

    #[test]
    fn test_advance_never_regresses() {
        assert_eq!(advance(40, 30), 40);
        assert_eq!(advance(40, 56), 56);
        assert_eq!(advance(90, 140), 100);
    }

    #[test]
    fn test_progress_is_monotonic_over_submissions() {
        let sequence = [
            (Question, "q1"), (Photo, "p1"), (Question, "q2"), (Question, "q1"),
            (Voice, "v1"), (Question, "q3"), (Game, "g1"), (Question, "q4"),
            (Question, "q5"), (Place, "pl1"), (Photo, "p2"), (Photo, "p3"),
            (Voice, "v2"), (Game, "g2"),
        ];
        let mut seen = Vec::new();
        let mut current = 0;
        for key in sequence {
            seen.push(key);
            let next = advance(current, progress_from_keys(seen.iter().copied()));
            assert!(next >= current);
            current = next;
        }
        assert_eq!(current, 100);
    }

    #[test]
    fn test_breakdown_lists_every_category() {
        let mut map = BTreeMap::new();
        map.insert(Question, CategoryCounts { completed: 2, mine: 3, theirs: 2 });
        let breakdown = category_breakdown(&map);
        assert_eq!(breakdown.len(), ActivityCategory::ALL.len());
        assert_eq!(breakdown[0].category, Question);
        assert_eq!(breakdown[0].completed, 2);
        assert_eq!(breakdown[0].max, 5);
        assert_eq!(breakdown[1].completed, 0);
    }
}
