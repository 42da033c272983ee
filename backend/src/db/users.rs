use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::UserProfile;

pub struct ProfileUpdate<'a> {
    pub display_name: &'a str,
    pub interests: &'a [String],
    pub values: &'a [String],
    pub looking_for: &'a [String],
}

pub async fn upsert_profile<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    update: &ProfileUpdate<'_>,
) -> Result<UserProfile> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO users (id, display_name, interests, "values", looking_for)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET display_name = EXCLUDED.display_name,
            interests = EXCLUDED.interests,
            "values" = EXCLUDED."values",
            looking_for = EXCLUDED.looking_for,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(update.display_name)
    .bind(update.interests)
    .bind(update.values)
    .bind(update.looking_for)
    .fetch_one(executor)
    .await?;

    Ok(profile)
}

/// Make sure a row exists for a user known to the identity provider
pub async fn ensure_user<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn get_profile<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(profile)
}
