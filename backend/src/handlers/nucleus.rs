use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::auth::ActingUser;
use crate::models::{ActivityRecord, AnswerPayload, ChatLevel, ConnectionStatus, GamePayload};
use crate::services::nucleus::{ActivityEntry, GameEntry, QuestionEntry, VoiceEntry};
use crate::services::{NucleusOverview, SubmissionOutcome};
use crate::state::AppState;

/// What the client needs after any submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub record: ActivityRecord,
    pub key_completed: bool,
    pub progress: i32,
    pub chat_level: ChatLevel,
    pub status: ConnectionStatus,
    pub completed_now: bool,
}

impl From<SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            progress: outcome.connection.progress,
            chat_level: outcome.connection.chat_level(),
            status: outcome.connection.status,
            key_completed: outcome.key_completed,
            completed_now: outcome.completed_now,
            record: outcome.record,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer: AnswerPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    pub slot: i32,
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRequest {
    pub prompt_id: String,
    pub url: String,
    pub duration_secs: i32,
}

pub async fn overview(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NucleusOverview>> {
    Ok(Json(state.ledger.overview(id, user_id).await?))
}

pub async fn questions(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, category)): Path<(Uuid, String)>,
) -> Result<Json<Vec<QuestionEntry>>> {
    Ok(Json(state.nucleus.questions(id, user_id, &category).await?))
}

pub async fn answer_question(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, category)): Path<(Uuid, String)>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SubmissionResponse>> {
    let outcome = state
        .nucleus
        .answer_question(id, user_id, &category, &req.question_id, &req.answer)
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn photos(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>> {
    Ok(Json(state.nucleus.photos(id, user_id).await?))
}

pub async fn submit_photo(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PhotoRequest>,
) -> Result<Json<SubmissionResponse>> {
    let outcome = state
        .nucleus
        .submit_photo(id, user_id, req.slot, &req.url, req.caption.as_deref())
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn voices(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<VoiceEntry>>> {
    Ok(Json(state.nucleus.voices(id, user_id).await?))
}

pub async fn submit_voice(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<VoiceRequest>,
) -> Result<Json<SubmissionResponse>> {
    let outcome = state
        .nucleus
        .submit_voice(id, user_id, &req.prompt_id, &req.url, req.duration_secs)
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn games(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GameEntry>>> {
    Ok(Json(state.nucleus.games(id, user_id).await?))
}

pub async fn play_game(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path((id, game_id)): Path<(Uuid, String)>,
    Json(entry): Json<GamePayload>,
) -> Result<Json<SubmissionResponse>> {
    let outcome = state.nucleus.play_game(id, user_id, &game_id, &entry).await?;
    Ok(Json(outcome.into()))
}
