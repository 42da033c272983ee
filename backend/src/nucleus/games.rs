use serde::Serialize;

use crate::constants::GAME_STATEMENT_MAX_CHARS;
use crate::error::{CoreError, Result};
use crate::models::GamePayload;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dilemma {
    pub left: &'static str,
    pub right: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub instructions: &'static str,
    pub dilemmas: &'static [Dilemma],
}

pub const TWO_TRUTHS_ONE_LIE: &str = "two-truths-one-lie";
pub const WOULD_YOU_RATHER: &str = "would-you-rather";

pub static GAMES: &[GameDefinition] = &[
    GameDefinition {
        id: TWO_TRUTHS_ONE_LIE,
        title: "Two truths and a lie",
        instructions: "Write three statements about yourself and mark which one is the lie",
        dilemmas: &[],
    },
    GameDefinition {
        id: WOULD_YOU_RATHER,
        title: "Would you rather",
        instructions: "Pick one side of every dilemma",
        dilemmas: &[
            Dilemma { left: "travel to the past", right: "travel to the future" },
            Dilemma { left: "never use social media again", right: "never watch another series" },
            Dilemma { left: "live by the beach", right: "live in the mountains" },
        ],
    },
];

pub fn find(id: &str) -> Option<&'static GameDefinition> {
    GAMES.iter().find(|g| g.id == id)
}

/// Check a game entry and return the normalized form.
pub fn validate_entry(game: &GameDefinition, entry: &GamePayload) -> Result<GamePayload> {
    match (game.id, entry) {
        (TWO_TRUTHS_ONE_LIE, GamePayload::TwoTruthsOneLie { statements, lie_index }) => {
            if statements.len() != 3 {
                return Err(CoreError::validation("Write exactly three statements"));
            }
            let statements = statements
                .iter()
                .map(|s| {
                    let s = s.trim();
                    if s.is_empty() {
                        Err(CoreError::validation("Statements cannot be empty"))
                    } else if s.chars().count() > GAME_STATEMENT_MAX_CHARS {
                        Err(CoreError::validation(format!(
                            "Statements must be at most {} characters",
                            GAME_STATEMENT_MAX_CHARS
                        )))
                    } else {
                        Ok(s.to_string())
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            if *lie_index > 2 {
                return Err(CoreError::validation("lieIndex must point at one of the three statements"));
            }
            Ok(GamePayload::TwoTruthsOneLie { statements, lie_index: *lie_index })
        }
        (WOULD_YOU_RATHER, GamePayload::WouldYouRather { choices }) => {
            if choices.len() != game.dilemmas.len() {
                return Err(CoreError::validation(format!(
                    "Answer all {} dilemmas",
                    game.dilemmas.len()
                )));
            }
            let choices = choices
                .iter()
                .zip(game.dilemmas)
                .map(|(choice, dilemma)| {
                    let choice = choice.trim();
                    [dilemma.left, dilemma.right]
                        .into_iter()
                        .find(|side| side.eq_ignore_ascii_case(choice))
                        .map(str::to_string)
                        .ok_or_else(|| CoreError::validation(format!("'{}' is not a side of the dilemma", choice)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(GamePayload::WouldYouRather { choices })
        }
        _ => Err(CoreError::validation(format!("Entry does not belong to game {}", game.id))),
    }
}
