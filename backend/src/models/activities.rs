use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    Question,
    Photo,
    Voice,
    Game,
    Place,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        Self::Question,
        Self::Photo,
        Self::Voice,
        Self::Game,
        Self::Place,
    ];
}

/// Answer to a nucleus question, tagged by the question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerPayload {
    Text(String),
    Choice(String),
    ThisOrThat(String),
    Ranking(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "kebab-case")]
pub enum GamePayload {
    #[serde(rename_all = "camelCase")]
    TwoTruthsOneLie { statements: Vec<String>, lie_index: u8 },
    WouldYouRather { choices: Vec<String> },
}

/// Everything a participant can submit into the nucleus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityPayload {
    Answer(AnswerPayload),
    #[serde(rename_all = "camelCase")]
    Photo { url: String, caption: Option<String> },
    #[serde(rename_all = "camelCase")]
    Voice { url: String, duration_secs: i32 },
    Game(GamePayload),
    #[serde(rename_all = "camelCase")]
    Place { suggestion_id: Uuid },
}

impl ActivityPayload {
    pub fn category(&self) -> ActivityCategory {
        match self {
            Self::Answer(_) => ActivityCategory::Question,
            Self::Photo { .. } => ActivityCategory::Photo,
            Self::Voice { .. } => ActivityCategory::Voice,
            Self::Game(_) => ActivityCategory::Game,
            Self::Place { .. } => ActivityCategory::Place,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub connection_id: Uuid,
    pub category: ActivityCategory,
    pub activity_key: String,
    pub user_id: Uuid,
    pub payload: Json<ActivityPayload>,
    pub both_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_payload_is_tagged_by_question_type() {
        let ranking: AnswerPayload = serde_json::from_value(json!({
            "type": "RANKING",
            "value": ["family", "career", "travel"]
        }))
        .unwrap();
        assert_eq!(
            ranking,
            AnswerPayload::Ranking(vec!["family".into(), "career".into(), "travel".into()])
        );

        let this_or_that: AnswerPayload =
            serde_json::from_value(json!({ "type": "THIS_OR_THAT", "value": "beach" })).unwrap();
        assert_eq!(this_or_that, AnswerPayload::ThisOrThat("beach".into()));
    }

    #[test]
    fn test_untyped_answer_is_rejected() {
        let result = serde_json::from_value::<AnswerPayload>(json!({ "value": "beach" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_game_payload_shape() {
        let game: GamePayload = serde_json::from_value(json!({
            "game": "two-truths-one-lie",
            "statements": ["a", "b", "c"],
            "lieIndex": 1
        }))
        .unwrap();
        assert_eq!(
            game,
            GamePayload::TwoTruthsOneLie {
                statements: vec!["a".into(), "b".into(), "c".into()],
                lie_index: 1
            }
        );
    }

    #[test]
    fn test_payload_category() {
        let payload = ActivityPayload::Voice { url: "https://cdn/x.m4a".into(), duration_secs: 12 };
        assert_eq!(payload.category(), ActivityCategory::Voice);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "VOICE");
        assert_eq!(json["data"]["durationSecs"], 12);
    }
}
