use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::auth::ActingUser;
use crate::models::MissionRound;
use crate::services::missions::MissionView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub template_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub response: String,
}

pub async fn current(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<MissionView>>> {
    Ok(Json(state.missions.current(id, user_id).await?))
}

pub async fn start(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<MissionRound>)> {
    let round = state.missions.start(id, user_id).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

pub async fn vote(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, round_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<MissionRound>> {
    Ok(Json(state.missions.vote(id, user_id, round_id, &req.template_id).await?))
}

pub async fn respond(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, round_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<MissionRound>> {
    Ok(Json(state.missions.respond(id, user_id, round_id, &req.response).await?))
}

pub async fn skip(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, round_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MissionRound>> {
    Ok(Json(state.missions.skip(id, user_id, round_id).await?))
}
