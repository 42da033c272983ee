use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::db::{activities, connections};
use crate::error::{CoreError, Result};
use crate::models::{ActivityPayload, ActivityRecord, ChatLevel, Connection, ConnectionStatus, Temperature};
use crate::nucleus::lifecycle::{self, LifecycleAction};
use crate::nucleus::progress::{self, CategoryCounts, CategoryProgress};
use crate::services::events::{EventHub, SocketEvent};
use crate::services::lifecycle::{apply_system, load_for_participant, lock_for_participant};

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub record: ActivityRecord,
    /// This submission completed the key for both participants
    pub key_completed: bool,
    pub previous_progress: i32,
    pub connection: Connection,
    /// Progress reached 100 with this submission
    pub completed_now: bool,
}

impl SubmissionOutcome {
    pub fn progress_changed(&self) -> bool {
        self.connection.progress != self.previous_progress
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NucleusOverview {
    pub connection_id: Uuid,
    pub status: ConnectionStatus,
    pub progress: i32,
    pub chat_level: ChatLevel,
    pub temperature: Temperature,
    pub compatibility_score: i32,
    pub categories: Vec<CategoryProgress>,
}

/// Store one submission inside the caller's transaction. The caller must
/// already hold the row lock on `connection`, which serializes the two
/// participants so only one of them can be the second submitter.
pub(crate) async fn record_in_tx(
    tx: &mut PgConnection,
    connection: &Connection,
    user_id: Uuid,
    activity_key: &str,
    payload: &ActivityPayload,
) -> Result<SubmissionOutcome> {
    if !lifecycle::accepts_activity(connection.status, connection.cooled_from) {
        return Err(CoreError::InvalidTransition {
            action: "add activity to",
            status: connection.status,
        });
    }

    let category = payload.category();
    let record = activities::insert_record(&mut *tx, connection.id, activity_key, user_id, payload)
        .await?
        .ok_or_else(|| {
            CoreError::DuplicateSubmission(format!("{:?} '{}'", category, activity_key).to_lowercase())
        })?;

    let mut current = connection.clone();
    if current.status == ConnectionStatus::Cooled {
        current = apply_system(&mut *tx, &current, LifecycleAction::Revive).await?;
        info!("Connection {} revived by new activity", current.id);
    }

    let previous_progress = current.progress;
    let key_completed = activities::mark_key_completed(&mut *tx, current.id, category, activity_key).await? > 0;

    let mut completed_now = false;
    if key_completed {
        let counts = activities::completed_counts(&mut *tx, current.id).await?;
        let next = progress::advance(previous_progress, progress::compute_progress(&counts));
        current = connections::record_progress(&mut *tx, current.id, next).await?;

        if current.progress >= 100 && current.status == ConnectionStatus::Active {
            current = apply_system(&mut *tx, &current, LifecycleAction::Complete).await?;
            completed_now = true;
        }
    } else {
        connections::touch_activity(&mut *tx, current.id).await?;
        current.last_activity = Utc::now();
    }

    Ok(SubmissionOutcome {
        record: ActivityRecord {
            both_completed: key_completed,
            ..record
        },
        key_completed,
        previous_progress,
        connection: current,
        completed_now,
    })
}

#[derive(Clone)]
pub struct ActivityLedger {
    pool: PgPool,
    events: EventHub,
}

impl ActivityLedger {
    pub fn new(pool: PgPool, events: EventHub) -> Self {
        Self { pool, events }
    }

    pub async fn record_submission(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        activity_key: &str,
        payload: &ActivityPayload,
    ) -> Result<SubmissionOutcome> {
        let mut tx = self.pool.begin().await?;
        let (connection, _) = lock_for_participant(&mut tx, connection_id, user_id).await?;
        let outcome = record_in_tx(&mut tx, &connection, user_id, activity_key, payload).await?;
        tx.commit().await?;

        self.log_outcome(&outcome);
        self.announce(&outcome).await;
        Ok(outcome)
    }

    pub(crate) fn log_outcome(&self, outcome: &SubmissionOutcome) {
        let record = &outcome.record;
        if outcome.key_completed {
            info!(
                "Connection {}: {:?} '{}' completed by both, progress {} -> {}",
                record.connection_id,
                record.category,
                record.activity_key,
                outcome.previous_progress,
                outcome.connection.progress
            );
        } else {
            info!(
                "Connection {}: {} submitted {:?} '{}'",
                record.connection_id, record.user_id, record.category, record.activity_key
            );
        }
        if outcome.completed_now {
            info!("Connection {} reached 100% and is now COMPLETED", record.connection_id);
        }
    }

    /// Hints go out only after commit
    pub(crate) async fn announce(&self, outcome: &SubmissionOutcome) {
        let connection = &outcome.connection;
        let participants = connection.participants();
        self.events
            .emit_all(&participants, SocketEvent::NucleusUpdated { connection_id: connection.id })
            .await;

        if outcome.progress_changed() {
            self.events
                .emit_all(
                    &participants,
                    SocketEvent::ProgressUpdate {
                        connection_id: connection.id,
                        progress: connection.progress,
                        chat_level: connection.chat_level(),
                    },
                )
                .await;
        }
    }

    pub async fn overview(&self, connection_id: Uuid, viewer: Uuid) -> Result<NucleusOverview> {
        let connection = load_for_participant(&self.pool, connection_id, viewer).await?;
        let partner = connection.partner_of(viewer).unwrap_or(connection.receiver_id);

        let completed = activities::completed_counts(&self.pool, connection_id).await?;
        let submitted = activities::submission_counts(&self.pool, connection_id).await?;

        let mut counts: BTreeMap<_, CategoryCounts> = BTreeMap::new();
        for (category, count) in completed {
            counts.entry(category).or_default().completed = count;
        }
        for (category, user_id, count) in submitted {
            let entry = counts.entry(category).or_default();
            if user_id == viewer {
                entry.mine = count;
            } else if user_id == partner {
                entry.theirs = count;
            }
        }

        Ok(NucleusOverview {
            connection_id,
            status: connection.status,
            progress: connection.progress,
            chat_level: connection.chat_level(),
            temperature: connection.temperature(Utc::now()),
            compatibility_score: connection.compatibility_score,
            categories: progress::category_breakdown(&counts),
        })
    }

    /// Progress recomputed from the full completion history. Read-only.
    pub async fn recompute_progress(&self, connection_id: Uuid) -> Result<i32> {
        let keys = activities::completed_keys(&self.pool, connection_id).await?;
        Ok(progress::progress_from_keys(keys.iter().map(|(c, k)| (*c, k.as_str()))))
    }

    pub async fn records(
        &self,
        connection_id: Uuid,
        viewer: Uuid,
        category: crate::models::ActivityCategory,
    ) -> Result<(Connection, Vec<ActivityRecord>)> {
        let connection = load_for_participant(&self.pool, connection_id, viewer).await?;
        let records = activities::list_records(&self.pool, connection_id, category).await?;
        Ok((connection, records))
    }
}
