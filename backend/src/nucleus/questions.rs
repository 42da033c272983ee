use std::collections::HashSet;

use serde::Serialize;

use crate::constants::TEXT_ANSWER_MAX_CHARS;
use crate::error::{CoreError, Result};
use crate::models::AnswerPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Text,
    Choice,
    ThisOrThat,
    Ranking,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: &'static str,
    pub category: &'static str,
    pub prompt: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: &'static [&'static str],
}

pub const QUESTION_CATEGORIES: [&str; 4] = ["values", "lifestyle", "dreams", "fun"];

pub static QUESTIONS: &[Question] = &[
    // values
    Question {
        id: "values-1",
        category: "values",
        prompt: "What does honesty look like in a relationship for you?",
        kind: QuestionType::Text,
        options: &[],
    },
    Question {
        id: "values-2",
        category: "values",
        prompt: "Rank what matters most to you right now",
        kind: QuestionType::Ranking,
        options: &["family", "career", "friends", "adventure"],
    },
    Question {
        id: "values-3",
        category: "values",
        prompt: "When you disagree with someone you love, you usually...",
        kind: QuestionType::Choice,
        options: &["talk it out right away", "take time to think", "let it go", "write it down"],
    },
    Question {
        id: "values-4",
        category: "values",
        prompt: "Tradition or reinvention?",
        kind: QuestionType::ThisOrThat,
        options: &["tradition", "reinvention"],
    },
    // lifestyle
    Question {
        id: "lifestyle-1",
        category: "lifestyle",
        prompt: "Early bird or night owl?",
        kind: QuestionType::ThisOrThat,
        options: &["early bird", "night owl"],
    },
    Question {
        id: "lifestyle-2",
        category: "lifestyle",
        prompt: "Your ideal Sunday",
        kind: QuestionType::Choice,
        options: &["outdoors", "with friends", "at home", "exploring the city"],
    },
    Question {
        id: "lifestyle-3",
        category: "lifestyle",
        prompt: "Describe a small habit that makes your day better",
        kind: QuestionType::Text,
        options: &[],
    },
    Question {
        id: "lifestyle-4",
        category: "lifestyle",
        prompt: "Rank how you like to spend free time",
        kind: QuestionType::Ranking,
        options: &["reading", "sports", "music", "cooking"],
    },
    // dreams
    Question {
        id: "dreams-1",
        category: "dreams",
        prompt: "Where would you live if you could live anywhere?",
        kind: QuestionType::Text,
        options: &[],
    },
    Question {
        id: "dreams-2",
        category: "dreams",
        prompt: "Mountains or sea?",
        kind: QuestionType::ThisOrThat,
        options: &["mountains", "sea"],
    },
    Question {
        id: "dreams-3",
        category: "dreams",
        prompt: "In five years you hope to be...",
        kind: QuestionType::Choice,
        options: &["settled", "traveling", "building something", "learning"],
    },
    Question {
        id: "dreams-4",
        category: "dreams",
        prompt: "What is something you have always wanted to try?",
        kind: QuestionType::Text,
        options: &[],
    },
    // fun
    Question {
        id: "fun-1",
        category: "fun",
        prompt: "Cats or dogs?",
        kind: QuestionType::ThisOrThat,
        options: &["cats", "dogs"],
    },
    Question {
        id: "fun-2",
        category: "fun",
        prompt: "Pick your karaoke genre",
        kind: QuestionType::Choice,
        options: &["pop", "rock", "reggaeton", "ballads"],
    },
    Question {
        id: "fun-3",
        category: "fun",
        prompt: "Rank these snacks",
        kind: QuestionType::Ranking,
        options: &["popcorn", "chocolate", "chips", "fruit"],
    },
    Question {
        id: "fun-4",
        category: "fun",
        prompt: "What is the funniest thing that happened to you this year?",
        kind: QuestionType::Text,
        options: &[],
    },
];

pub fn find(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

pub fn in_category(category: &str) -> Vec<&'static Question> {
    QUESTIONS.iter().filter(|q| q.category == category).collect()
}

fn matching_option(question: &Question, value: &str) -> Result<String> {
    let value = value.trim();
    question
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(value))
        .map(|o| o.to_string())
        .ok_or_else(|| CoreError::validation(format!("'{}' is not an option for {}", value, question.id)))
}

/// Check an answer against its question and return the normalized form.
pub fn validate_answer(question: &Question, answer: &AnswerPayload) -> Result<AnswerPayload> {
    match (question.kind, answer) {
        (QuestionType::Text, AnswerPayload::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(CoreError::validation("Answer cannot be empty"));
            }
            if text.chars().count() > TEXT_ANSWER_MAX_CHARS {
                return Err(CoreError::validation(format!(
                    "Answer must be at most {} characters",
                    TEXT_ANSWER_MAX_CHARS
                )));
            }
            Ok(AnswerPayload::Text(text.to_string()))
        }
        (QuestionType::Choice, AnswerPayload::Choice(choice)) => {
            Ok(AnswerPayload::Choice(matching_option(question, choice)?))
        }
        (QuestionType::ThisOrThat, AnswerPayload::ThisOrThat(pick)) => {
            Ok(AnswerPayload::ThisOrThat(matching_option(question, pick)?))
        }
        (QuestionType::Ranking, AnswerPayload::Ranking(items)) => {
            if items.len() != question.options.len() {
                return Err(CoreError::validation(format!(
                    "Ranking must order all {} options",
                    question.options.len()
                )));
            }
            let ranked = items
                .iter()
                .map(|item| matching_option(question, item))
                .collect::<Result<Vec<_>>>()?;
            let distinct: HashSet<&String> = ranked.iter().collect();
            if distinct.len() != ranked.len() {
                return Err(CoreError::validation("Ranking cannot repeat an option"));
            }
            Ok(AnswerPayload::Ranking(ranked))
        }
        _ => Err(CoreError::validation(format!(
            "Question {} expects a {:?} answer",
            question.id, question.kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        let ids: HashSet<&str> = QUESTIONS.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), QUESTIONS.len());

        for q in QUESTIONS {
            assert!(QUESTION_CATEGORIES.contains(&q.category), "{}", q.id);
            match q.kind {
                QuestionType::Text => assert!(q.options.is_empty()),
                QuestionType::ThisOrThat => assert_eq!(q.options.len(), 2),
                QuestionType::Choice | QuestionType::Ranking => assert!(q.options.len() >= 2),
            }
        }
    }

    #[test]
    fn test_enough_questions_to_fill_the_category() {
        let weight = crate::constants::weight_for(crate::models::ActivityCategory::Question);
        assert!(QUESTIONS.len() as i32 >= weight.max_units);
        for category in QUESTION_CATEGORIES {
            assert!(!in_category(category).is_empty());
        }
    }

    #[test]
    fn test_text_answer() {
        let q = find("values-1").unwrap();
        assert_eq!(
            validate_answer(q, &AnswerPayload::Text("  being open  ".into())).unwrap(),
            AnswerPayload::Text("being open".into())
        );
        assert!(validate_answer(q, &AnswerPayload::Text("   ".into())).is_err());
        assert!(validate_answer(q, &AnswerPayload::Text("x".repeat(TEXT_ANSWER_MAX_CHARS + 1))).is_err());
    }

    #[test]
    fn test_choice_answer_is_normalized() {
        let q = find("lifestyle-2").unwrap();
        assert_eq!(
            validate_answer(q, &AnswerPayload::Choice("AT HOME".into())).unwrap(),
            AnswerPayload::Choice("at home".into())
        );
        assert!(validate_answer(q, &AnswerPayload::Choice("on the moon".into())).is_err());
    }

    #[test]
    fn test_this_or_that_answer() {
        let q = find("fun-1").unwrap();
        assert!(validate_answer(q, &AnswerPayload::ThisOrThat("dogs".into())).is_ok());
        assert!(validate_answer(q, &AnswerPayload::ThisOrThat("birds".into())).is_err());
    }

    #[test]
    fn test_ranking_must_be_a_permutation() {
        let q = find("fun-3").unwrap();
        let good = AnswerPayload::Ranking(vec![
            "fruit".into(), "chips".into(), "popcorn".into(), "chocolate".into(),
        ]);
        assert!(validate_answer(q, &good).is_ok());

        let repeated = AnswerPayload::Ranking(vec![
            "fruit".into(), "fruit".into(), "popcorn".into(), "chocolate".into(),
        ]);
        assert!(validate_answer(q, &repeated).is_err());

        let short = AnswerPayload::Ranking(vec!["fruit".into()]);
        assert!(validate_answer(q, &short).is_err());
    }

    #[test]
    fn test_wrong_answer_type_rejected() {
        let q = find("fun-3").unwrap();
        assert!(matches!(
            validate_answer(q, &AnswerPayload::Text("fruit".into())),
            Err(CoreError::Validation(_))
        ));
    }
}
