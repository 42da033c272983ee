use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PlaceStatus, PlaceSuggestion, PlaceVote};

pub struct NewSuggestion<'a> {
    pub name: &'a str,
    pub address: Option<&'a str>,
    pub note: Option<&'a str>,
}

pub async fn insert_suggestion<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    suggested_by: Uuid,
    suggestion: &NewSuggestion<'_>,
) -> Result<PlaceSuggestion> {
    let suggestion = sqlx::query_as::<_, PlaceSuggestion>(
        r#"
        INSERT INTO place_suggestions (connection_id, suggested_by, name, address, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(connection_id)
    .bind(suggested_by)
    .bind(suggestion.name)
    .bind(suggestion.address)
    .bind(suggestion.note)
    .fetch_one(executor)
    .await?;

    Ok(suggestion)
}

pub async fn get_suggestion<'e>(
    executor: impl PgExecutor<'e>,
    connection_id: Uuid,
    suggestion_id: Uuid,
) -> Result<Option<PlaceSuggestion>> {
    let suggestion = sqlx::query_as::<_, PlaceSuggestion>(
        "SELECT * FROM place_suggestions WHERE id = $1 AND connection_id = $2",
    )
    .bind(suggestion_id)
    .bind(connection_id)
    .fetch_optional(executor)
    .await?;

    Ok(suggestion)
}

pub async fn list_suggestions<'e>(executor: impl PgExecutor<'e>, connection_id: Uuid) -> Result<Vec<PlaceSuggestion>> {
    let suggestions = sqlx::query_as::<_, PlaceSuggestion>(
        "SELECT * FROM place_suggestions WHERE connection_id = $1 ORDER BY created_at DESC",
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await?;

    Ok(suggestions)
}

pub async fn list_votes<'e>(executor: impl PgExecutor<'e>, connection_id: Uuid) -> Result<Vec<PlaceVote>> {
    let votes = sqlx::query_as::<_, PlaceVote>(
        r#"
        SELECT v.* FROM place_votes v
        JOIN place_suggestions s ON s.id = v.suggestion_id
        WHERE s.connection_id = $1
        "#,
    )
    .bind(connection_id)
    .fetch_all(executor)
    .await?;

    Ok(votes)
}

/// `None` when the user already voted on this suggestion
pub async fn insert_vote<'e>(
    executor: impl PgExecutor<'e>,
    suggestion_id: Uuid,
    user_id: Uuid,
    agree: bool,
) -> Result<Option<PlaceVote>> {
    let vote = sqlx::query_as::<_, PlaceVote>(
        r#"
        INSERT INTO place_votes (suggestion_id, user_id, agree)
        VALUES ($1, $2, $3)
        ON CONFLICT (suggestion_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(suggestion_id)
    .bind(user_id)
    .bind(agree)
    .fetch_optional(executor)
    .await?;

    Ok(vote)
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    suggestion_id: Uuid,
    status: PlaceStatus,
) -> Result<PlaceSuggestion> {
    let suggestion = sqlx::query_as::<_, PlaceSuggestion>(
        "UPDATE place_suggestions SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(suggestion_id)
    .bind(status)
    .fetch_one(executor)
    .await?;

    Ok(suggestion)
}
