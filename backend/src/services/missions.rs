use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::db::{connections, missions};
use crate::error::{CoreError, Result, is_unique_violation};
use crate::models::{Connection, ConnectionStatus, MissionResponse, MissionRound, MissionStatus, MissionVote};
use crate::nucleus::lifecycle::{self, LifecycleAction};
use crate::nucleus::missions::{self as templates, MissionTemplate};
use crate::services::events::{EventHub, SocketEvent};
use crate::services::lifecycle::{apply_system, load_for_participant, lock_for_participant};

/// A mission round from one participant's side. The partner's vote stays
/// hidden while voting is open, their response until both have answered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionView {
    pub round_id: Uuid,
    pub status: MissionStatus,
    pub candidates: Vec<&'static MissionTemplate>,
    pub selected: Option<&'static MissionTemplate>,
    pub expires_at: chrono::DateTime<Utc>,
    pub my_vote: Option<String>,
    pub partner_voted: bool,
    pub partner_vote: Option<String>,
    pub my_response: Option<String>,
    pub partner_responded: bool,
    pub partner_response: Option<String>,
}

pub fn round_view(
    round: &MissionRound,
    votes: &[MissionVote],
    responses: &[MissionResponse],
    viewer: Uuid,
) -> MissionView {
    let my_vote = votes.iter().find(|v| v.user_id == viewer).map(|v| v.template_id.clone());
    let partner_vote = votes.iter().find(|v| v.user_id != viewer).map(|v| v.template_id.clone());
    let my_response = responses.iter().find(|r| r.user_id == viewer).map(|r| r.response.clone());
    let partner_response = responses.iter().find(|r| r.user_id != viewer).map(|r| r.response.clone());

    MissionView {
        round_id: round.id,
        status: round.status,
        candidates: round.candidates.iter().filter_map(|id| templates::find(id)).collect(),
        selected: round.selected_template.as_deref().and_then(templates::find),
        expires_at: round.expires_at,
        partner_voted: partner_vote.is_some(),
        partner_vote: partner_vote.filter(|_| round.status != MissionStatus::Voting),
        partner_responded: partner_response.is_some(),
        partner_response: partner_response.filter(|_| my_response.is_some()),
        my_vote,
        my_response,
    }
}

/// Joint challenges: vote on one of three templates, then both respond.
#[derive(Clone)]
pub struct MissionBoard {
    pool: PgPool,
    events: EventHub,
    duration: Duration,
}

impl MissionBoard {
    pub fn new(pool: PgPool, events: EventHub, duration_days: i64) -> Self {
        Self {
            pool,
            events,
            duration: Duration::days(duration_days),
        }
    }

    /// Lock the connection and make sure it takes activity, reviving it when cooled.
    async fn open_connection(
        &self,
        tx: &mut PgConnection,
        connection_id: Uuid,
        user_id: Uuid,
        action: &'static str,
    ) -> Result<Connection> {
        let (connection, _) = lock_for_participant(&mut *tx, connection_id, user_id).await?;
        if !lifecycle::accepts_activity(connection.status, connection.cooled_from) {
            return Err(CoreError::InvalidTransition {
                action,
                status: connection.status,
            });
        }
        if connection.status == ConnectionStatus::Cooled {
            return apply_system(&mut *tx, &connection, LifecycleAction::Revive).await;
        }
        connections::touch_activity(&mut *tx, connection_id).await?;
        Ok(connection)
    }

    async fn open_round(tx: &mut PgConnection, connection_id: Uuid, round_id: Uuid) -> Result<MissionRound> {
        missions::get_round(&mut *tx, connection_id, round_id)
            .await?
            .ok_or(CoreError::NotFound("mission round"))
    }

    pub async fn current(&self, connection_id: Uuid, viewer: Uuid) -> Result<Option<MissionView>> {
        load_for_participant(&self.pool, connection_id, viewer).await?;
        let Some(round) = missions::latest_round(&self.pool, connection_id).await? else {
            return Ok(None);
        };
        let votes = missions::list_votes(&self.pool, round.id).await?;
        let responses = missions::list_responses(&self.pool, round.id).await?;
        Ok(Some(round_view(&round, &votes, &responses, viewer)))
    }

    pub async fn start(&self, connection_id: Uuid, user_id: Uuid) -> Result<MissionRound> {
        let mut tx = self.pool.begin().await?;
        let connection = self
            .open_connection(&mut tx, connection_id, user_id, "start a mission on")
            .await?;

        let now = Utc::now();
        if let Some(latest) = missions::latest_round(&mut *tx, connection_id).await? {
            if !latest.status.is_terminal() {
                if latest.expires_at > now {
                    return Err(CoreError::InvalidState("A mission is already in progress".to_string()));
                }
                missions::update_round(&mut *tx, latest.id, latest.status, MissionStatus::Expired, None, None).await?;
            }
        }

        let candidates = {
            let mut rng = rand::rng();
            templates::draw_candidates(&mut rng)
        };
        let round = match missions::insert_round(&mut *tx, connection_id, &candidates, now + self.duration).await {
            Ok(round) => round,
            Err(CoreError::Database(e)) if is_unique_violation(&e) => {
                return Err(CoreError::InvalidState("A mission is already in progress".to_string()));
            }
            Err(e) => return Err(e),
        };
        tx.commit().await?;

        info!("Connection {}: mission round {} started by {}", connection_id, round.id, user_id);
        self.announce(&connection).await;
        Ok(round)
    }

    /// The second vote resolves the round: agreement wins, otherwise a coin flip.
    pub async fn vote(&self, connection_id: Uuid, user_id: Uuid, round_id: Uuid, template_id: &str) -> Result<MissionRound> {
        let mut tx = self.pool.begin().await?;
        let connection = self
            .open_connection(&mut tx, connection_id, user_id, "vote on a mission of")
            .await?;

        let round = Self::open_round(&mut tx, connection_id, round_id).await?;
        if round.status != MissionStatus::Voting {
            return Err(CoreError::InvalidState(format!("Mission round is {:?}, not voting", round.status)));
        }
        let template_id = templates::validate_vote(&round.candidates, template_id)?;

        missions::insert_vote(&mut *tx, round_id, user_id, &template_id)
            .await?
            .ok_or_else(|| CoreError::DuplicateSubmission("mission vote".to_string()))?;

        let votes = missions::list_votes(&mut *tx, round_id).await?;
        let round = match votes.as_slice() {
            [first, second, ..] => {
                let selected = {
                    let mut rng = rand::rng();
                    templates::resolve_votes(&first.template_id, &second.template_id, &mut rng)
                };
                let activated = missions::update_round(
                    &mut *tx,
                    round_id,
                    MissionStatus::Voting,
                    MissionStatus::Active,
                    Some(&selected),
                    Some(Utc::now() + self.duration),
                )
                .await?
                .ok_or_else(|| CoreError::InvalidState("Mission round is no longer voting".to_string()))?;
                info!("Connection {}: mission '{}' selected", connection_id, selected);
                activated
            }
            _ => round,
        };
        tx.commit().await?;

        self.announce(&connection).await;
        Ok(round)
    }

    pub async fn respond(&self, connection_id: Uuid, user_id: Uuid, round_id: Uuid, response: &str) -> Result<MissionRound> {
        let response = templates::validate_response(response)?;

        let mut tx = self.pool.begin().await?;
        let connection = self
            .open_connection(&mut tx, connection_id, user_id, "respond to a mission of")
            .await?;

        let round = Self::open_round(&mut tx, connection_id, round_id).await?;
        if round.status != MissionStatus::Active {
            return Err(CoreError::InvalidState(format!("Mission round is {:?}, not active", round.status)));
        }

        missions::insert_response(&mut *tx, round_id, user_id, &response)
            .await?
            .ok_or_else(|| CoreError::DuplicateSubmission("mission response".to_string()))?;

        let responses = missions::list_responses(&mut *tx, round_id).await?;
        let round = if responses.len() >= 2 {
            let completed = missions::update_round(
                &mut *tx,
                round_id,
                MissionStatus::Active,
                MissionStatus::Completed,
                None,
                None,
            )
            .await?
            .ok_or_else(|| CoreError::InvalidState("Mission round is no longer active".to_string()))?;
            info!("Connection {}: mission round {} completed", connection_id, round_id);
            completed
        } else {
            round
        };
        tx.commit().await?;

        self.announce(&connection).await;
        Ok(round)
    }

    pub async fn skip(&self, connection_id: Uuid, user_id: Uuid, round_id: Uuid) -> Result<MissionRound> {
        let mut tx = self.pool.begin().await?;
        let (connection, _) = lock_for_participant(&mut tx, connection_id, user_id).await?;

        let round = Self::open_round(&mut tx, connection_id, round_id).await?;
        if round.status.is_terminal() {
            return Err(CoreError::InvalidState(format!("Mission round is already {:?}", round.status)));
        }
        let skipped = missions::update_round(&mut *tx, round_id, round.status, MissionStatus::Skipped, None, None)
            .await?
            .ok_or_else(|| CoreError::InvalidState("Mission round changed meanwhile".to_string()))?;
        tx.commit().await?;

        info!("Connection {}: mission round {} skipped by {}", connection_id, round_id, user_id);
        self.announce(&connection).await;
        Ok(skipped)
    }

    async fn announce(&self, connection: &Connection) {
        self.events
            .emit_all(
                &connection.participants(),
                SocketEvent::NucleusUpdated {
                    connection_id: connection.id,
                },
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(status: MissionStatus) -> MissionRound {
        let now = Utc::now();
        MissionRound {
            id: Uuid::new_v4(),
            connection_id: Uuid::new_v4(),
            status,
            candidates: vec!["shared-playlist".into(), "book-swap".into(), "gratitude".into()],
            selected_template: (status != MissionStatus::Voting).then(|| "book-swap".to_string()),
            expires_at: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        }
    }

    fn vote(round: &MissionRound, user_id: Uuid, template_id: &str) -> MissionVote {
        MissionVote {
            round_id: round.id,
            user_id,
            template_id: template_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn response(round: &MissionRound, user_id: Uuid, text: &str) -> MissionResponse {
        MissionResponse {
            round_id: round.id,
            user_id,
            response: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partner_vote_hidden_while_voting() {
        let (me, partner) = (Uuid::new_v4(), Uuid::new_v4());
        let voting = round(MissionStatus::Voting);
        let votes = vec![vote(&voting, partner, "gratitude")];

        let view = round_view(&voting, &votes, &[], me);
        assert!(view.partner_voted);
        assert_eq!(view.partner_vote, None);
        assert_eq!(view.my_vote, None);
        assert_eq!(view.candidates.len(), 3);
        assert!(view.selected.is_none());
    }

    #[test]
    fn test_votes_visible_once_resolved() {
        let (me, partner) = (Uuid::new_v4(), Uuid::new_v4());
        let active = round(MissionStatus::Active);
        let votes = vec![vote(&active, partner, "gratitude"), vote(&active, me, "book-swap")];

        let view = round_view(&active, &votes, &[], me);
        assert_eq!(view.partner_vote.as_deref(), Some("gratitude"));
        assert_eq!(view.my_vote.as_deref(), Some("book-swap"));
        assert_eq!(view.selected.map(|t| t.id), Some("book-swap"));
    }

    #[test]
    fn test_partner_response_needs_own_response() {
        let (me, partner) = (Uuid::new_v4(), Uuid::new_v4());
        let active = round(MissionStatus::Active);
        let mut responses = vec![response(&active, partner, "three songs")];

        let view = round_view(&active, &[], &responses, me);
        assert!(view.partner_responded);
        assert_eq!(view.partner_response, None);

        responses.push(response(&active, me, "my songs"));
        let view = round_view(&active, &[], &responses, me);
        assert_eq!(view.partner_response.as_deref(), Some("three songs"));
        assert_eq!(view.my_response.as_deref(), Some("my songs"));
    }
}
