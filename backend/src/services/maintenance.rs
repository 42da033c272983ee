use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::db::{connections, missions};
use crate::error::Result;
use crate::models::{Connection, ConnectionStatus};
use crate::nucleus::lifecycle::LifecycleAction;
use crate::services::events::{EventHub, SocketEvent};
use crate::services::lifecycle::apply_system;
use crate::utils::Config;

/// When idle connections cool and when cooled ones end.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    pub cooling_after: Duration,
    /// Extra idle time a cooled connection gets before it ends
    pub cooled_end_after: Duration,
}

impl SweepPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cooling_after: Duration::days(config.cooling_after_days),
            cooled_end_after: Duration::days(config.cooled_end_after_days),
        }
    }

    pub fn cooling_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.cooling_after
    }

    /// Cooling never touches last activity, so a cooled connection ends once
    /// it has been idle for both periods.
    pub fn expiry_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.cooling_after - self.cooled_end_after
    }

    /// The system action due for this connection, if any
    pub fn due_action(&self, connection: &Connection, now: DateTime<Utc>) -> Option<LifecycleAction> {
        match connection.status {
            ConnectionStatus::Active | ConnectionStatus::Later
                if connection.last_activity < self.cooling_cutoff(now) =>
            {
                Some(LifecycleAction::Cool)
            }
            ConnectionStatus::Cooled if connection.last_activity < self.expiry_cutoff(now) => {
                Some(LifecycleAction::Expire)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub cooled: usize,
    pub expired: usize,
    pub missions_expired: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.cooled == 0 && self.expired == 0 && self.missions_expired == 0 && self.failed == 0
    }
}

/// Periodic maintenance: cools idle connections, ends long-cooled ones and
/// expires overdue mission rounds.
#[derive(Clone)]
pub struct Sweeper {
    pool: PgPool,
    events: EventHub,
    policy: SweepPolicy,
}

impl Sweeper {
    pub fn new(pool: PgPool, events: EventHub, policy: SweepPolicy) -> Self {
        Self { pool, events, policy }
    }

    pub async fn run_once(&self) -> Result<SweepReport> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        let mut candidates = Vec::new();
        for status in [ConnectionStatus::Active, ConnectionStatus::Later] {
            candidates.extend(connections::find_idle(&self.pool, status, self.policy.cooling_cutoff(now)).await?);
        }
        candidates.extend(
            connections::find_idle(&self.pool, ConnectionStatus::Cooled, self.policy.expiry_cutoff(now)).await?,
        );

        for candidate in candidates {
            match self.apply_due(candidate.id, now).await {
                Ok(Some(LifecycleAction::Cool)) => report.cooled += 1,
                Ok(Some(_)) => report.expired += 1,
                Ok(None) => {}
                Err(e) => {
                    error!("❌ Failed to sweep connection {}: {}", candidate.id, e);
                    report.failed += 1;
                }
            }
        }

        let rounds = missions::expire_overdue(&self.pool, now).await?;
        report.missions_expired = rounds.len();
        for round in &rounds {
            debug!("Mission round {} expired on connection {}", round.id, round.connection_id);
        }

        Ok(report)
    }

    /// Re-check under the row lock: a participant may have acted since the scan.
    async fn apply_due(&self, connection_id: Uuid, now: DateTime<Utc>) -> Result<Option<LifecycleAction>> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = connections::lock_connection(&mut *tx, connection_id).await? else {
            return Ok(None);
        };
        let Some(action) = self.policy.due_action(&current, now) else {
            return Ok(None);
        };

        let updated = apply_system(&mut tx, &current, action).await?;
        tx.commit().await?;

        info!(
            "Connection {} {} -> {} after inactivity",
            connection_id, current.status, updated.status
        );
        self.events
            .emit_all(&updated.participants(), SocketEvent::NucleusUpdated { connection_id })
            .await;
        Ok(Some(action))
    }

    /// Sweep forever at a fixed interval
    pub async fn run(self, interval_secs: u64) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        let mut iter_count: usize = 0;

        loop {
            interval.tick().await;
            iter_count += 1;

            match self.run_once().await {
                Ok(report) if !report.is_empty() => {
                    info!(
                        "🧹 Sweep {}: {} cooled, {} expired, {} missions expired, {} failed",
                        iter_count, report.cooled, report.expired, report.missions_expired, report.failed
                    );
                }
                Ok(_) => debug!("Sweep {}: nothing to do", iter_count),
                Err(e) => error!("❌ Sweep {} failed: {}", iter_count, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::connections::sample_connection;

    fn policy() -> SweepPolicy {
        SweepPolicy {
            cooling_after: Duration::days(14),
            cooled_end_after: Duration::days(30),
        }
    }

    #[test]
    fn test_idle_active_and_later_cool() {
        let now = Utc::now();
        for status in [ConnectionStatus::Active, ConnectionStatus::Later] {
            let mut conn = sample_connection(status, 20);
            conn.last_activity = now - Duration::days(15);
            assert_eq!(policy().due_action(&conn, now), Some(LifecycleAction::Cool));

            conn.last_activity = now - Duration::days(13);
            assert_eq!(policy().due_action(&conn, now), None);
        }
    }

    #[test]
    fn test_cooled_ends_after_both_periods() {
        let now = Utc::now();
        let mut conn = sample_connection(ConnectionStatus::Cooled, 20);
        conn.cooled_from = Some(ConnectionStatus::Active);

        conn.last_activity = now - Duration::days(40);
        assert_eq!(policy().due_action(&conn, now), None);

        conn.last_activity = now - Duration::days(45);
        assert_eq!(policy().due_action(&conn, now), Some(LifecycleAction::Expire));
    }

    #[test]
    fn test_other_statuses_are_left_alone() {
        let now = Utc::now();
        for status in [ConnectionStatus::Pending, ConnectionStatus::Completed, ConnectionStatus::Ended] {
            let mut conn = sample_connection(status, 0);
            conn.last_activity = now - Duration::days(365);
            assert_eq!(policy().due_action(&conn, now), None);
        }
    }
}
