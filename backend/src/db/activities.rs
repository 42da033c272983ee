use std::collections::BTreeMap;

use sqlx::{PgExecutor, types::Json};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ActivityCategory, ActivityPayload, ActivityRecord};

/// Insert one submission. `None` means this user already submitted the key:
/// the unique constraint decides, not a prior read.
pub async fn insert_record<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    activity_key: &str,
    user_id: Uuid,
    payload: &ActivityPayload,
) -> Result<Option<ActivityRecord>> {
    let record = sqlx::query_as::<_, ActivityRecord>(
        r#"
        INSERT INTO activity_records (connection_id, category, activity_key, user_id, payload)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (connection_id, category, activity_key, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(connection_id)
    .bind(payload.category())
    .bind(activity_key)
    .bind(user_id)
    .bind(Json(payload))
    .fetch_optional(executor)
    .await?;

    Ok(record)
}

/// Flag every record of the key as completed once two distinct users submitted it.
/// Returns the number of rows that flipped.
pub async fn mark_key_completed<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    category: ActivityCategory,
    activity_key: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE activity_records
        SET both_completed = TRUE
        WHERE connection_id = $1 AND category = $2 AND activity_key = $3
          AND NOT both_completed
          AND (
            SELECT COUNT(DISTINCT user_id) FROM activity_records
            WHERE connection_id = $1 AND category = $2 AND activity_key = $3
          ) >= 2
        "#,
    )
    .bind(connection_id)
    .bind(category)
    .bind(activity_key)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Distinct mutually completed keys per category
pub async fn completed_counts<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
) -> Result<BTreeMap<ActivityCategory, i64>> {
    let rows = sqlx::query_as::<_, (ActivityCategory, i64)>(
        r#"
        SELECT category, COUNT(DISTINCT activity_key)
        FROM activity_records
        WHERE connection_id = $1 AND both_completed
        GROUP BY category
        "#,
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Submitted keys per category and user
pub async fn submission_counts<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
) -> Result<Vec<(ActivityCategory, Uuid, i64)>> {
    let rows = sqlx::query_as::<_, (ActivityCategory, Uuid, i64)>(
        r#"
        SELECT category, user_id, COUNT(*)
        FROM activity_records
        WHERE connection_id = $1
        GROUP BY category, user_id
        "#,
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

pub async fn list_records<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    category: ActivityCategory,
) -> Result<Vec<ActivityRecord>> {
    let records = sqlx::query_as::<_, ActivityRecord>(
        r#"
        SELECT * FROM activity_records
        WHERE connection_id = $1 AND category = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(connection_id)
    .bind(category)
    .fetch_all(executor)
    .await?;

    Ok(records)
}

/// Every completed (category, key) pair, for full recomputation
pub async fn completed_keys<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
) -> Result<Vec<(ActivityCategory, String)>> {
    let keys = sqlx::query_as::<_, (ActivityCategory, String)>(
        r#"
        SELECT DISTINCT category, activity_key
        FROM activity_records
        WHERE connection_id = $1 AND both_completed
        "#,
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await?;

    Ok(keys)
}
