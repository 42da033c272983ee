use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::db::{
    connections::{self, ListFilter, SortBy, StatusChange},
    users,
};
use crate::error::{CoreError, Result, is_unique_violation};
use crate::models::{Connection, ConnectionStatus, ConnectionView, EndKind, ParticipantRole};
use crate::nucleus::lifecycle::{self, LifecycleAction};
use crate::services::compatibility;
use crate::services::events::{EventHub, SocketEvent};
use crate::services::transparency::{self, TransparencyView};

/// Lock a connection inside a transaction and check the user belongs to it.
pub(crate) async fn lock_for_participant(
    tx: &mut PgConnection,
    connection_id: Uuid,
    user_id: Uuid,
) -> Result<(Connection, ParticipantRole)> {
    let connection = connections::lock_connection(&mut *tx, connection_id)
        .await?
        .ok_or(CoreError::NotFound("connection"))?;
    let role = connection
        .role_of(user_id)
        .ok_or(CoreError::Unauthorized("you are not part of this connection"))?;
    Ok((connection, role))
}

/// Read a connection outside a transaction and check the user belongs to it.
pub(crate) async fn load_for_participant(pool: &PgPool, connection_id: Uuid, user_id: Uuid) -> Result<Connection> {
    let connection = connections::get_connection(pool, connection_id)
        .await?
        .ok_or(CoreError::NotFound("connection"))?;
    if connection.role_of(user_id).is_none() {
        return Err(CoreError::Unauthorized("you are not part of this connection"));
    }
    Ok(connection)
}

/// Apply a system-driven transition to a locked connection.
pub(crate) async fn apply_system(
    tx: &mut PgConnection,
    current: &Connection,
    action: LifecycleAction,
) -> Result<Connection> {
    let next = lifecycle::next_status(current.status, current.cooled_from, action, None)?;
    let mut change = StatusChange::new(current.status, next);
    match action {
        LifecycleAction::Cool => change = change.cooled_from(current.status),
        LifecycleAction::Revive => change = change.touching_activity(),
        LifecycleAction::Expire => {
            change = change.ended(
                EndKind::Expired,
                None,
                Some(crate::constants::EXPIRED_REASON.to_string()),
            )
        }
        _ => {}
    }

    connections::update_status(&mut *tx, current.id, &change)
        .await?
        .ok_or(CoreError::InvalidTransition {
            action: action.verb(),
            status: current.status,
        })
}

#[derive(Clone)]
pub struct ConnectionLifecycle {
    pool: PgPool,
    events: EventHub,
}

impl ConnectionLifecycle {
    pub fn new(pool: PgPool, events: EventHub) -> Self {
        Self { pool, events }
    }

    pub async fn initiate(&self, initiator_id: Uuid, target_id: Uuid) -> Result<Connection> {
        if initiator_id == target_id {
            return Err(CoreError::validation("You cannot connect with yourself"));
        }

        let mut tx = self.pool.begin().await?;
        users::ensure_user(&mut *tx, initiator_id).await?;
        let initiator = users::get_profile(&mut *tx, initiator_id)
            .await?
            .ok_or(CoreError::NotFound("user"))?;
        let target = users::get_profile(&mut *tx, target_id)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        let score = compatibility::compute_score(&initiator, &target);
        let connection = match connections::insert_connection(&mut *tx, initiator_id, target_id, score).await {
            Ok(connection) => connection,
            Err(CoreError::Database(e)) if is_unique_violation(&e) => {
                tracing::debug!("Duplicate connection between {} and {}", initiator_id, target_id);
                return Err(CoreError::DuplicateConnection);
            }
            Err(e) => return Err(e),
        };
        tx.commit().await?;

        info!(
            "Connection {} initiated by {} toward {} (compatibility {})",
            connection.id, initiator_id, target_id, score
        );
        self.events
            .emit(
                target_id,
                SocketEvent::ConnectionRequest {
                    connection_id: connection.id,
                    from_user_id: initiator_id,
                },
            )
            .await;

        Ok(connection)
    }

    /// Check-and-set a user-driven transition. Two racing requests both lock
    /// the row; the second sees the new status and fails.
    async fn transition(
        &self,
        connection_id: Uuid,
        acting_user_id: Uuid,
        action: LifecycleAction,
        end_reason: Option<String>,
    ) -> Result<Connection> {
        let mut tx = self.pool.begin().await?;
        let (current, role) = lock_for_participant(&mut tx, connection_id, acting_user_id).await?;
        let next = lifecycle::next_status(current.status, current.cooled_from, action, Some(role))?;

        let mut change = StatusChange::new(current.status, next);
        change = match action {
            LifecycleAction::Accept => change.touching_activity(),
            LifecycleAction::Decline => change.ended(EndKind::Declined, Some(acting_user_id), end_reason),
            LifecycleAction::Dissolve => change.ended(EndKind::Dissolved, Some(acting_user_id), end_reason),
            _ => change,
        };

        let updated = connections::update_status(&mut *tx, connection_id, &change)
            .await?
            .ok_or(CoreError::InvalidTransition {
                action: action.verb(),
                status: current.status,
            })?;
        tx.commit().await?;

        info!(
            "Connection {} {} -> {} ({} by {})",
            connection_id, current.status, updated.status, action.verb(), acting_user_id
        );
        Ok(updated)
    }

    pub async fn accept(&self, connection_id: Uuid, acting_user_id: Uuid) -> Result<Connection> {
        let connection = self
            .transition(connection_id, acting_user_id, LifecycleAction::Accept, None)
            .await?;

        self.events
            .emit(
                connection.initiator_id,
                SocketEvent::ConnectionAccepted {
                    connection_id,
                    by_user_id: acting_user_id,
                },
            )
            .await;
        self.announce(&connection).await;
        Ok(connection)
    }

    pub async fn decline(&self, connection_id: Uuid, acting_user_id: Uuid, reason: Option<&str>) -> Result<Connection> {
        let reason = lifecycle::validate_decline_reason(reason)?;
        let connection = self
            .transition(connection_id, acting_user_id, LifecycleAction::Decline, reason)
            .await?;
        self.announce(&connection).await;
        Ok(connection)
    }

    pub async fn postpone(&self, connection_id: Uuid, acting_user_id: Uuid) -> Result<Connection> {
        let connection = self
            .transition(connection_id, acting_user_id, LifecycleAction::Postpone, None)
            .await?;
        self.announce(&connection).await;
        Ok(connection)
    }

    /// Ending an active relationship needs a reason of at least 20 words,
    /// checked here so a modified client cannot skip it.
    pub async fn dissolve(&self, connection_id: Uuid, acting_user_id: Uuid, reason_text: &str) -> Result<Connection> {
        let reason = lifecycle::validate_dissolve_reason(reason_text)?;
        let connection = self
            .transition(connection_id, acting_user_id, LifecycleAction::Dissolve, Some(reason))
            .await?;

        if let Some(partner_id) = connection.partner_of(acting_user_id) {
            self.events
                .emit(
                    partner_id,
                    SocketEvent::NucleusDissolved {
                        connection_id,
                        by_user_id: acting_user_id,
                    },
                )
                .await;
        }
        self.announce(&connection).await;
        Ok(connection)
    }

    /// Single connection as seen by `viewer`; the receiver opening a request marks it seen
    pub async fn view(&self, connection_id: Uuid, viewer: Uuid) -> Result<ConnectionView> {
        let mut connection = load_for_participant(&self.pool, connection_id, viewer).await?;

        let unseen_request = matches!(connection.status, ConnectionStatus::Pending | ConnectionStatus::Later)
            && connection.role_of(viewer) == Some(ParticipantRole::Receiver)
            && !connection.seen_by_receiver;
        if unseen_request {
            connections::mark_seen(&self.pool, connection_id).await?;
            connection.seen_by_receiver = true;
        }

        Ok(connection.view_for(viewer, Utc::now()))
    }

    pub async fn list(
        &self,
        viewer: Uuid,
        status: Option<ConnectionStatus>,
        filter: ListFilter,
        sort: SortBy,
    ) -> Result<Vec<ConnectionView>> {
        let now = Utc::now();
        let rows = connections::list_for_user(&self.pool, viewer, status, filter, sort).await?;
        Ok(rows.iter().map(|c| c.view_for(viewer, now)).collect())
    }

    pub async fn transparency(&self, viewer: Uuid) -> Result<TransparencyView> {
        let rows = connections::list_for_user(&self.pool, viewer, None, ListFilter::All, SortBy::Recent).await?;
        Ok(transparency::build(&rows, viewer, Utc::now()))
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
