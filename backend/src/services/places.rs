use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::constants::PLACE_NAME_MAX_CHARS;
use crate::db::places::{self, NewSuggestion};
use crate::error::{CoreError, Result};
use crate::models::{ActivityPayload, PlaceStatus, PlaceSuggestion, PlaceVote};
use crate::nucleus::lifecycle;
use crate::services::events::{EventHub, SocketEvent};
use crate::services::ledger::{ActivityLedger, SubmissionOutcome, record_in_tx};
use crate::services::lifecycle::{load_for_participant, lock_for_participant};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceEntry {
    #[serde(flatten)]
    pub suggestion: PlaceSuggestion,
    pub votes: Vec<PlaceVote>,
}

#[derive(Debug, Clone)]
pub struct PlaceOutcome {
    pub suggestion: PlaceSuggestion,
    pub submission: Option<SubmissionOutcome>,
}

fn clean_optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_place_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("Place name cannot be empty"));
    }
    if name.chars().count() > PLACE_NAME_MAX_CHARS {
        return Err(CoreError::validation(format!(
            "Place name must be at most {} characters",
            PLACE_NAME_MAX_CHARS
        )));
    }
    Ok(name)
}

/// Meeting place proposals. Each suggestion is one PLACE key in the ledger:
/// the suggester submits it when proposing, the partner when agreeing.
#[derive(Clone)]
pub struct PlaceBoard {
    pool: PgPool,
    ledger: ActivityLedger,
    events: EventHub,
}

impl PlaceBoard {
    pub fn new(pool: PgPool, ledger: ActivityLedger, events: EventHub) -> Self {
        Self { pool, ledger, events }
    }

    pub async fn list(&self, connection_id: Uuid, viewer: Uuid) -> Result<Vec<PlaceEntry>> {
        load_for_participant(&self.pool, connection_id, viewer).await?;
        let suggestions = places::list_suggestions(&self.pool, connection_id).await?;
        let votes = places::list_votes(&self.pool, connection_id).await?;

        Ok(suggestions
            .into_iter()
            .map(|suggestion| {
                let votes = votes
                    .iter()
                    .filter(|v| v.suggestion_id == suggestion.id)
                    .cloned()
                    .collect();
                PlaceEntry { suggestion, votes }
            })
            .collect())
    }

    pub async fn suggest(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        name: &str,
        address: Option<&str>,
        note: Option<&str>,
    ) -> Result<PlaceOutcome> {
        let name = validate_place_name(name)?;

        let mut tx = self.pool.begin().await?;
        let (connection, _) = lock_for_participant(&mut tx, connection_id, user_id).await?;
        if !lifecycle::accepts_activity(connection.status, connection.cooled_from) {
            return Err(CoreError::InvalidTransition {
                action: "suggest a place on",
                status: connection.status,
            });
        }

        let new = NewSuggestion {
            name,
            address: clean_optional(address),
            note: clean_optional(note),
        };
        let suggestion = places::insert_suggestion(&mut *tx, connection_id, user_id, &new).await?;
        let payload = ActivityPayload::Place { suggestion_id: suggestion.id };
        let submission = record_in_tx(&mut tx, &connection, user_id, &suggestion.id.to_string(), &payload).await?;
        tx.commit().await?;

        info!("Connection {}: {} suggested place '{}'", connection_id, user_id, suggestion.name);
        self.ledger.log_outcome(&submission);
        self.ledger.announce(&submission).await;

        Ok(PlaceOutcome {
            suggestion,
            submission: Some(submission),
        })
    }

    /// Agreeing completes the place key for both; disagreeing rejects it.
    pub async fn vote(&self, connection_id: Uuid, user_id: Uuid, suggestion_id: Uuid, agree: bool) -> Result<PlaceOutcome> {
        let mut tx = self.pool.begin().await?;
        let (connection, _) = lock_for_participant(&mut tx, connection_id, user_id).await?;
        if !lifecycle::accepts_activity(connection.status, connection.cooled_from) {
            return Err(CoreError::InvalidTransition {
                action: "vote on a place of",
                status: connection.status,
            });
        }

        let suggestion = places::get_suggestion(&mut *tx, connection_id, suggestion_id)
            .await?
            .ok_or(CoreError::NotFound("place suggestion"))?;
        if suggestion.suggested_by == user_id {
            return Err(CoreError::validation("You cannot vote on your own suggestion"));
        }
        if suggestion.status != PlaceStatus::Proposed {
            return Err(CoreError::InvalidState(format!(
                "Suggestion is already {:?}",
                suggestion.status
            )));
        }

        places::insert_vote(&mut *tx, suggestion_id, user_id, agree)
            .await?
            .ok_or_else(|| CoreError::DuplicateSubmission("place vote".to_string()))?;

        let (suggestion, submission) = if agree {
            let suggestion = places::set_status(&mut *tx, suggestion_id, PlaceStatus::Agreed).await?;
            let payload = ActivityPayload::Place { suggestion_id };
            let submission = record_in_tx(&mut tx, &connection, user_id, &suggestion_id.to_string(), &payload).await?;
            (suggestion, Some(submission))
        } else {
            let suggestion = places::set_status(&mut *tx, suggestion_id, PlaceStatus::Rejected).await?;
            (suggestion, None)
        };
        tx.commit().await?;

        info!(
            "Connection {}: place '{}' {} by {}",
            connection_id,
            suggestion.name,
            if agree { "agreed" } else { "rejected" },
            user_id
        );
        match &submission {
            Some(submission) => {
                self.ledger.log_outcome(submission);
                self.ledger.announce(submission).await;
            }
            None => {
                self.events
                    .emit_all(&connection.participants(), SocketEvent::NucleusUpdated { connection_id })
                    .await;
            }
        }

        Ok(PlaceOutcome { suggestion, submission })
    }
}
