use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Message;

pub async fn insert_message<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    sender_id: Uuid,
    body: &str,
) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (connection_id, sender_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(connection_id)
    .bind(sender_id)
    .bind(body)
    .fetch_one(executor)
    .await?;

    Ok(message)
}

/// Most recent `limit` messages, oldest first
pub async fn list_messages<'e>(executor: impl PgExecutor<'e>, connection_id: Uuid, limit: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM (
            SELECT * FROM messages
            WHERE connection_id = $1
            ORDER BY created_at DESC
            LIMIT $2
        ) recent
        ORDER BY created_at ASC
        "#,
    )
    .bind(connection_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(messages)
}
