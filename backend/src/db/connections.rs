use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Connection, ConnectionStatus, EndKind};

/// Which side of the connection the viewer is on when listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Initiated,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Recent,
    Compatibility,
    Progress,
}

impl SortBy {
    fn order_clause(self) -> &'static str {
        match self {
            Self::Recent => "last_activity DESC, created_at DESC",
            Self::Compatibility => "compatibility_score DESC, last_activity DESC",
            Self::Progress => "progress DESC, last_activity DESC",
        }
    }
}

/// Guarded status update: applied only if the row still has `expected` status.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub expected: ConnectionStatus,
    pub next: ConnectionStatus,
    pub cooled_from: Option<ConnectionStatus>,
    pub end_kind: Option<EndKind>,
    pub ended_by: Option<Uuid>,
    pub end_reason: Option<String>,
    /// Counts as participant activity
    pub touch_activity: bool,
}

impl StatusChange {
    pub fn new(expected: ConnectionStatus, next: ConnectionStatus) -> Self {
        Self {
            expected,
            next,
            cooled_from: None,
            end_kind: None,
            ended_by: None,
            end_reason: None,
            touch_activity: false,
        }
    }

    pub fn ended(mut self, kind: EndKind, by: Option<Uuid>, reason: Option<String>) -> Self {
        self.end_kind = Some(kind);
        self.ended_by = by;
        self.end_reason = reason;
        self
    }

    pub fn cooled_from(mut self, status: ConnectionStatus) -> Self {
        self.cooled_from = Some(status);
        self
    }

    pub fn touching_activity(mut self) -> Self {
        self.touch_activity = true;
        self
    }
}

pub async fn insert_connection<'e>(
    executor: impl PgExecutor<'e>,
    initiator_id: Uuid,
    receiver_id: Uuid,
    compatibility_score: i32,
) -> Result<Connection> {
    let connection = sqlx::query_as::<_, Connection>(
        r#"
        INSERT INTO connections (initiator_id, receiver_id, compatibility_score)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(initiator_id)
    .bind(receiver_id)
    .bind(compatibility_score)
    .fetch_one(executor)
    .await?;

    Ok(connection)
}

pub async fn get_connection<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Connection>> {
    let connection = sqlx::query_as::<_, Connection>("SELECT * FROM connections WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(connection)
}

/// Row-locks the connection until the surrounding transaction ends
pub async fn lock_connection<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Connection>> {
    let connection = sqlx::query_as::<_, Connection>("SELECT * FROM connections WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(connection)
}

/// Returns `None` when the status moved underneath us
pub async fn update_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    change: &StatusChange,
) -> Result<Option<Connection>> {
    let connection = sqlx::query_as::<_, Connection>(
        r#"
        UPDATE connections
        SET status = $3,
            cooled_from = $4,
            end_kind = $5,
            ended_by = $6,
            end_reason = $7,
            completed_at = CASE WHEN $3 = 'COMPLETED'::connection_status THEN NOW() ELSE completed_at END,
            last_activity = CASE WHEN $8 THEN NOW() ELSE last_activity END,
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(change.expected)
    .bind(change.next)
    .bind(change.cooled_from)
    .bind(change.end_kind)
    .bind(change.ended_by)
    .bind(change.end_reason.as_deref())
    .bind(change.touch_activity)
    .fetch_optional(executor)
    .await?;

    Ok(connection)
}

/// Store recomputed progress. The GREATEST guard keeps progress monotonic.
pub async fn record_progress<'e>(executor: impl PgExecutor<'e>, id: Uuid, progress: i32) -> Result<Connection> {
    let connection = sqlx::query_as::<_, Connection>(
        r#"
        UPDATE connections
        SET progress = GREATEST(progress, $2),
            last_activity = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(progress.clamp(0, 100))
    .fetch_one(executor)
    .await?;

    Ok(connection)
}

pub async fn touch_activity<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE connections SET last_activity = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn mark_seen<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE connections SET seen_by_receiver = TRUE WHERE id = $1 AND NOT seen_by_receiver")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn list_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    status: Option<ConnectionStatus>,
    filter: ListFilter,
    sort: SortBy,
) -> Result<Vec<Connection>> {
    let side = match filter {
        ListFilter::All => "(initiator_id = $1 OR receiver_id = $1)",
        ListFilter::Initiated => "initiator_id = $1",
        ListFilter::Received => "receiver_id = $1",
    };
    let sql = format!(
        "SELECT * FROM connections WHERE {} AND ($2::connection_status IS NULL OR status = $2) ORDER BY {}",
        side,
        sort.order_clause()
    );

    let connections = sqlx::query_as::<_, Connection>(&sql)
        .bind(user_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

    Ok(connections)
}

/// Connections in `status` whose last activity is older than `before`
pub async fn find_idle<'e>(
    executor: impl PgExecutor<'e>,
    status: ConnectionStatus,
    before: DateTime<Utc>,
) -> Result<Vec<Connection>> {
    let connections = sqlx::query_as::<_, Connection>(
        r#"
        SELECT * FROM connections
        WHERE status = $1 AND last_activity < $2
        ORDER BY last_activity ASC
        "#,
    )
    .bind(status)
    .bind(before)
    .fetch_all(executor)
    .await?;

    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_change_builder() {
        let id = Uuid::new_v4();
        let change = StatusChange::new(ConnectionStatus::Active, ConnectionStatus::Ended)
            .ended(EndKind::Dissolved, Some(id), Some("reason".into()))
            .touching_activity();
        assert_eq!(change.end_kind, Some(EndKind::Dissolved));
        assert_eq!(change.ended_by, Some(id));
        assert!(change.touch_activity);
        assert_eq!(change.cooled_from, None);
    }

    #[test]
    fn test_sort_defaults_to_recent() {
        assert_eq!(SortBy::default(), SortBy::Recent);
        assert!(SortBy::Progress.order_clause().starts_with("progress"));
    }
}
