use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::auth::ActingUser;
use crate::handlers::nucleus::SubmissionResponse;
use crate::models::PlaceSuggestion;
use crate::services::places::{PlaceEntry, PlaceOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub name: String,
    pub address: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub agree: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResponse {
    pub suggestion: PlaceSuggestion,
    pub submission: Option<SubmissionResponse>,
}

impl From<PlaceOutcome> for PlaceResponse {
    fn from(outcome: PlaceOutcome) -> Self {
        Self {
            suggestion: outcome.suggestion,
            submission: outcome.submission.map(Into::into),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlaceEntry>>> {
    Ok(Json(state.places.list(id, user_id).await?))
}

pub async fn suggest(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SuggestRequest>,
) -> Result<(StatusCode, Json<PlaceResponse>)> {
    let outcome = state
        .places
        .suggest(id, user_id, &req.name, req.address.as_deref(), req.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

pub async fn vote(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, suggestion_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<PlaceResponse>> {
    let outcome = state.places.vote(id, user_id, suggestion_id, req.agree).await?;
    Ok(Json(outcome.into()))
}
