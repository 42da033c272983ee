use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::constants::{MISSION_CANDIDATES, MISSION_RESPONSE_MAX_CHARS};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub static MISSION_TEMPLATES: &[MissionTemplate] = &[
    MissionTemplate {
        id: "shared-playlist",
        title: "Shared playlist",
        description: "Each of you adds three songs that describe your week",
    },
    MissionTemplate {
        id: "same-recipe",
        title: "Same recipe",
        description: "Cook the same dish on the same night and share how it went",
    },
    MissionTemplate {
        id: "sunset-photo",
        title: "Sunset photo",
        description: "Describe the sky where you are at sunset",
    },
    MissionTemplate {
        id: "childhood-memory",
        title: "Childhood memory",
        description: "Share a memory from when you were ten",
    },
    MissionTemplate {
        id: "book-swap",
        title: "Book swap",
        description: "Recommend a book and explain why in a few lines",
    },
    MissionTemplate {
        id: "gratitude",
        title: "Three good things",
        description: "Write three things you were grateful for today",
    },
];

pub fn find(id: &str) -> Option<&'static MissionTemplate> {
    MISSION_TEMPLATES.iter().find(|t| t.id == id)
}

/// Distinct templates offered in a new voting round
pub fn draw_candidates<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    MISSION_TEMPLATES
        .choose_multiple(rng, MISSION_CANDIDATES)
        .map(|t| t.id.to_string())
        .collect()
}

/// Agreement wins; otherwise one of the two picks at random.
pub fn resolve_votes<R: Rng + ?Sized>(first: &str, second: &str, rng: &mut R) -> String {
    if first == second || rng.random_bool(0.5) {
        first.to_string()
    } else {
        second.to_string()
    }
}

pub fn validate_vote(candidates: &[String], template_id: &str) -> Result<String> {
    candidates
        .iter()
        .find(|c| c.as_str() == template_id)
        .cloned()
        .ok_or_else(|| CoreError::validation(format!("'{}' is not a candidate of this round", template_id)))
}

pub fn validate_response(response: &str) -> Result<String> {
    let response = response.trim();
    if response.is_empty() {
        return Err(CoreError::validation("Response cannot be empty"));
    }
    if response.chars().count() > MISSION_RESPONSE_MAX_CHARS {
        return Err(CoreError::validation(format!(
            "Response must be at most {} characters",
            MISSION_RESPONSE_MAX_CHARS
        )));
    }
    Ok(response.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_candidates_are_distinct_templates() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let candidates = draw_candidates(&mut rng);
            assert_eq!(candidates.len(), MISSION_CANDIDATES);
            let distinct: HashSet<&String> = candidates.iter().collect();
            assert_eq!(distinct.len(), MISSION_CANDIDATES);
            assert!(candidates.iter().all(|c| find(c).is_some()));
        }
    }

    #[test]
    fn test_agreement_wins() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(resolve_votes("book-swap", "book-swap", &mut rng), "book-swap");
        }
    }

    #[test]
    fn test_disagreement_picks_one_of_the_votes() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let picked = resolve_votes("book-swap", "gratitude", &mut rng);
            assert!(picked == "book-swap" || picked == "gratitude");
        }
    }

    #[test]
    fn test_vote_must_be_a_candidate() {
        let candidates = vec!["book-swap".to_string(), "gratitude".to_string()];
        assert_eq!(validate_vote(&candidates, "gratitude").unwrap(), "gratitude");
        assert!(validate_vote(&candidates, "same-recipe").is_err());
    }

    #[test]
    fn test_response_validation() {
        assert_eq!(validate_response("  done it  ").unwrap(), "done it");
        assert!(validate_response("  ").is_err());
    }
}
