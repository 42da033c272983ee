use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "place_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceStatus {
    Proposed,
    Agreed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    pub id: Uuid,
    pub connection_id: Uuid,
    pub suggested_by: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub note: Option<String>,
    pub status: PlaceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaceVote {
    pub suggestion_id: Uuid,
    pub user_id: Uuid,
    pub agree: bool,
    pub created_at: DateTime<Utc>,
}
