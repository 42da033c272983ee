// =============================================================================
// Linka Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

use crate::models::ActivityCategory;

// =============================================================================
// CHAT GATE
// =============================================================================

/// Progress at which limited chat unlocks
pub const CHAT_LIMITED_THRESHOLD: i32 = 70;

/// Progress at which chat becomes unlimited
pub const CHAT_UNLIMITED_THRESHOLD: i32 = 100;

/// Maximum message body length while chat is limited
pub const LIMITED_MESSAGE_MAX_CHARS: usize = 500;

/// Maximum message body length once chat is unlimited
pub const UNLIMITED_MESSAGE_MAX_CHARS: usize = 4000;

/// Upper bound for a single page of chat history
pub const MESSAGE_PAGE_LIMIT: i64 = 200;

// =============================================================================
// PROGRESS WEIGHTS
// =============================================================================

/// Contribution of one activity category toward the 100% total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWeight {
    pub category: ActivityCategory,
    /// Percentage points credited when the category is full
    pub weight: i32,
    /// Number of mutually completed keys that fills the category
    pub max_units: i32,
}

pub const QUESTION_WEIGHT: ProgressWeight = ProgressWeight { category: ActivityCategory::Question, weight: 70, max_units: 5 };
pub const PHOTO_WEIGHT: ProgressWeight = ProgressWeight { category: ActivityCategory::Photo, weight: 10, max_units: 3 };
pub const VOICE_WEIGHT: ProgressWeight = ProgressWeight { category: ActivityCategory::Voice, weight: 10, max_units: 2 };
pub const GAME_WEIGHT: ProgressWeight = ProgressWeight { category: ActivityCategory::Game, weight: 5, max_units: 2 };
pub const PLACE_WEIGHT: ProgressWeight = ProgressWeight { category: ActivityCategory::Place, weight: 5, max_units: 1 };

/// Weighted categories; the weights must add up to 100.
pub const PROGRESS_WEIGHTS: [ProgressWeight; 5] = [QUESTION_WEIGHT, PHOTO_WEIGHT, VOICE_WEIGHT, GAME_WEIGHT, PLACE_WEIGHT];

/// Look up the weight entry of a category
pub fn weight_for(category: ActivityCategory) -> &'static ProgressWeight {
    match category {
        ActivityCategory::Question => &QUESTION_WEIGHT,
        ActivityCategory::Photo => &PHOTO_WEIGHT,
        ActivityCategory::Voice => &VOICE_WEIGHT,
        ActivityCategory::Game => &GAME_WEIGHT,
        ActivityCategory::Place => &PLACE_WEIGHT,
    }
}

// =============================================================================
// CONNECTION LIFECYCLE
// =============================================================================

/// Minimum number of words a dissolve reason must contain
pub const DISSOLVE_MIN_WORDS: usize = 20;

/// Maximum length of a decline or dissolve reason
pub const REASON_MAX_CHARS: usize = 2000;

/// Default idle days before an ACTIVE or LATER connection cools
pub const DEFAULT_COOLING_AFTER_DAYS: i64 = 14;

/// Default idle days a COOLED connection survives before it ends
pub const DEFAULT_COOLED_END_AFTER_DAYS: i64 = 30;

/// Reason recorded when a cooled connection expires
pub const EXPIRED_REASON: &str = "Connection ended after a long period without activity";

// =============================================================================
// TEMPERATURE
// =============================================================================

/// Last activity newer than this is HOT
pub const HOT_WITHIN_HOURS: i64 = 24;

/// Last activity newer than this is WARM
pub const WARM_WITHIN_HOURS: i64 = 72;

/// Last activity newer than this is COOL, anything older is COLD
pub const COOL_WITHIN_HOURS: i64 = 168;

// =============================================================================
// COMPATIBILITY
// =============================================================================

/// Share of the score driven by interest overlap
pub const INTEREST_WEIGHT: f64 = 0.6;

/// Share of the score driven by values and "looking for" overlap
pub const VALUES_WEIGHT: f64 = 0.4;

/// Maximum number of entries kept per profile list
pub const PROFILE_LIST_MAX: usize = 30;

// =============================================================================
// ACTIVITY PAYLOADS
// =============================================================================

/// Maximum length of a free-text question answer
pub const TEXT_ANSWER_MAX_CHARS: usize = 1000;

/// Number of photo slots in the nucleus
pub const PHOTO_SLOTS: i32 = 3;

/// Maximum photo caption length
pub const PHOTO_CAPTION_MAX_CHARS: usize = 280;

/// Shortest accepted voice note in seconds
pub const VOICE_MIN_SECS: i32 = 1;

/// Longest accepted voice note in seconds
pub const VOICE_MAX_SECS: i32 = 120;

/// Maximum length of a media reference URL
pub const MEDIA_URL_MAX_CHARS: usize = 2048;

/// Maximum length of one two-truths-one-lie statement
pub const GAME_STATEMENT_MAX_CHARS: usize = 200;

/// Maximum length of a place name
pub const PLACE_NAME_MAX_CHARS: usize = 120;

// =============================================================================
// MISSIONS
// =============================================================================

/// Candidate templates offered per voting round
pub const MISSION_CANDIDATES: usize = 3;

/// Default lifetime of an active mission round
pub const DEFAULT_MISSION_DURATION_DAYS: i64 = 7;

/// Maximum length of a mission response
pub const MISSION_RESPONSE_MAX_CHARS: usize = 2000;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default maintenance sweep interval
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Header carrying the acting user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Capacity of each per-user event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let total: i32 = PROGRESS_WEIGHTS.iter().map(|w| w.weight).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_every_category_has_a_weight() {
        for category in ActivityCategory::ALL {
            assert_eq!(weight_for(category).category, category);
            assert!(weight_for(category).max_units > 0);
        }
    }

    #[test]
    fn test_table_and_lookup_agree() {
        for entry in PROGRESS_WEIGHTS {
            assert_eq!(*weight_for(entry.category), entry);
        }
        assert_eq!(weight_for(ActivityCategory::Place).weight, 5);
        assert_eq!(weight_for(ActivityCategory::Photo).max_units, 3);
    }

    #[test]
    fn test_question_weight_reaches_limited_chat() {
        assert_eq!(weight_for(ActivityCategory::Question).weight, CHAT_LIMITED_THRESHOLD);
    }
}
