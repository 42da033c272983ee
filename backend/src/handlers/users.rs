use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::PROFILE_LIST_MAX;
use crate::db::users::{self, ProfileUpdate};
use crate::error::{CoreError, Result};
use crate::handlers::auth::ActingUser;
use crate::models::UserProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub looking_for: Vec<String>,
}

fn clean_list(field: &str, items: &[String]) -> Result<Vec<String>> {
    if items.len() > PROFILE_LIST_MAX {
        return Err(CoreError::validation(format!(
            "{} can hold at most {} entries",
            field, PROFILE_LIST_MAX
        )));
    }
    Ok(items
        .iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

pub async fn update_me(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<UserProfile>> {
    let display_name = req.display_name.trim();
    if display_name.is_empty() {
        return Err(CoreError::validation("Display name cannot be empty"));
    }

    let interests = clean_list("interests", &req.interests)?;
    let values = clean_list("values", &req.values)?;
    let looking_for = clean_list("lookingFor", &req.looking_for)?;

    let profile = users::upsert_profile(
        &state.pool,
        user_id,
        &ProfileUpdate {
            display_name,
            interests: &interests,
            values: &values,
            looking_for: &looking_for,
        },
    )
    .await?;

    tracing::info!("Profile updated for {}", user_id);
    Ok(Json(profile))
}

pub async fn get_me(State(state): State<AppState>, ActingUser(user_id): ActingUser) -> Result<Json<UserProfile>> {
    users::ensure_user(&state.pool, user_id).await?;
    let profile = users::get_profile(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound("user"))?;
    Ok(Json(profile))
}

pub async fn get_user(
    State(state): State<AppState>,
    ActingUser(_): ActingUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>> {
    let profile = users::get_profile(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound("user"))?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_list_trims_and_drops_blanks() {
        let items = vec![" hiking ".to_string(), "".to_string(), "jazz".to_string()];
        assert_eq!(clean_list("interests", &items).unwrap(), vec!["hiking", "jazz"]);
    }

    #[test]
    fn test_clean_list_caps_length() {
        let items = vec!["x".to_string(); PROFILE_LIST_MAX + 1];
        assert!(matches!(clean_list("values", &items), Err(CoreError::Validation(_))));
    }
}
