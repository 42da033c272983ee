use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::auth::ActingUser;
use crate::models::Message;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub body: String,
}

pub async fn list(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.chat.list(id, user_id).await?))
}

pub async fn send(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = state.chat.send(id, user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
