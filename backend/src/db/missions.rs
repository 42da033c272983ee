use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{MissionResponse, MissionRound, MissionStatus, MissionVote};

pub async fn insert_round<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    candidates: &[String],
    expires_at: DateTime<Utc>,
) -> Result<MissionRound> {
    let round = sqlx::query_as::<_, MissionRound>(
        r#"
        INSERT INTO mission_rounds (connection_id, candidates, expires_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(connection_id)
    .bind(candidates)
    .bind(expires_at)
    .fetch_one(executor)
    .await?;

    Ok(round)
}

/// Most recent round of the connection, open or not
pub async fn latest_round<'e>(executor: impl PgExecutor<'e>, connection_id: Uuid) -> Result<Option<MissionRound>> {
    let round = sqlx::query_as::<_, MissionRound>(
        "SELECT * FROM mission_rounds WHERE connection_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(connection_id)
    .fetch_optional(executor)
    .await?;

    Ok(round)
}

pub async fn get_round<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    round_id: Uuid,
) -> Result<Option<MissionRound>> {
    let round = sqlx::query_as::<_, MissionRound>(
        "SELECT * FROM mission_rounds WHERE id = $1 AND connection_id = $2",
    )
    .bind(round_id)
    .bind(connection_id)
    .fetch_optional(executor)
    .await?;

    Ok(round)
}

pub async fn list_votes<'e>(executor: impl PgExecutor<'e>, round_id: Uuid) -> Result<Vec<MissionVote>> {
    let votes = sqlx::query_as::<_, MissionVote>(
        "SELECT * FROM mission_votes WHERE round_id = $1 ORDER BY created_at ASC",
    )
    .bind(round_id)
    .fetch_all(executor)
    .await?;

    Ok(votes)
}

pub async fn insert_vote<'e>(
    executor: impl PgExecutor<'e>,
    round_id: Uuid,
    user_id: Uuid,
    template_id: &str,
) -> Result<Option<MissionVote>> {
    let vote = sqlx::query_as::<_, MissionVote>(
        r#"
        INSERT INTO mission_votes (round_id, user_id, template_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (round_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(round_id)
    .bind(user_id)
    .bind(template_id)
    .fetch_optional(executor)
    .await?;

    Ok(vote)
}

pub async fn list_responses<'e>(executor: impl PgExecutor<'e>, round_id: Uuid) -> Result<Vec<MissionResponse>> {
    let responses = sqlx::query_as::<_, MissionResponse>(
        "SELECT * FROM mission_responses WHERE round_id = $1 ORDER BY created_at ASC",
    )
    .bind(round_id)
    .fetch_all(executor)
    .await?;

    Ok(responses)
}

pub async fn insert_response<'e>(
    executor: impl PgExecutor<'e>,
    round_id: Uuid,
    user_id: Uuid,
    response: &str,
) -> Result<Option<MissionResponse>> {
    let response = sqlx::query_as::<_, MissionResponse>(
        r#"
        INSERT INTO mission_responses (round_id, user_id, response)
        VALUES ($1, $2, $3)
        ON CONFLICT (round_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(round_id)
    .bind(user_id)
    .bind(response)
    .fetch_optional(executor)
    .await?;

    Ok(response)
}

/// Move a round from `expected` to `next`; `None` if it was no longer `expected`
pub async fn update_round<'e>(
    executor: impl PgExecutor<'e>,
    round_id: Uuid,
    expected: MissionStatus,
    next: MissionStatus,
    selected_template: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Option<MissionRound>> {
    let round = sqlx::query_as::<_, MissionRound>(
        r#"
        UPDATE mission_rounds
        SET status = $3,
            selected_template = COALESCE($4, selected_template),
            expires_at = COALESCE($5, expires_at),
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(round_id)
    .bind(expected)
    .bind(next)
    .bind(selected_template)
    .bind(expires_at)
    .fetch_optional(executor)
    .await?;

    Ok(round)
}

/// Expire open rounds past their deadline, returning the affected rounds
pub async fn expire_overdue<'e>(executor: impl PgExecutor<'e>, now: DateTime<Utc>) -> Result<Vec<MissionRound>> {
    let rounds = sqlx::query_as::<_, MissionRound>(
        r#"
        UPDATE mission_rounds
        SET status = 'EXPIRED', updated_at = NOW()
        WHERE status IN ('VOTING', 'ACTIVE') AND expires_at < $1
        RETURNING *
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await?;

    Ok(rounds)
}
