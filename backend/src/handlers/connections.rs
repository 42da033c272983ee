use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::connections::{ListFilter, SortBy};
use crate::error::{CoreError, Result};
use crate::handlers::auth::ActingUser;
use crate::models::{Connection, ConnectionStatus, ConnectionView};
use crate::services::transparency::TransparencyView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub target_user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

pub fn parse_list_query(query: &ListQuery) -> Result<(Option<ConnectionStatus>, ListFilter, SortBy)> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ConnectionStatus>)
        .transpose()
        .map_err(CoreError::Validation)?;

    let filter = match query.filter.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("all") => ListFilter::All,
        Some("initiated") => ListFilter::Initiated,
        Some("received") => ListFilter::Received,
        Some(other) => return Err(CoreError::validation(format!("unknown filter: {}", other))),
    };

    let sort = match query.sort_by.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("recent") => SortBy::Recent,
        Some("compatibility") => SortBy::Compatibility,
        Some("progress") => SortBy::Progress,
        Some(other) => return Err(CoreError::validation(format!("unknown sortBy: {}", other))),
    };

    Ok((status, filter, sort))
}

pub async fn initiate(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(req): Json<InitiateRequest>,
) -> Result<(StatusCode, Json<Connection>)> {
    let connection = state.lifecycle.initiate(user_id, req.target_user_id).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

pub async fn list(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ConnectionView>>> {
    let (status, filter, sort) = parse_list_query(&query)?;
    Ok(Json(state.lifecycle.list(user_id, status, filter, sort).await?))
}

pub async fn transparency(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> Result<Json<TransparencyView>> {
    Ok(Json(state.lifecycle.transparency(user_id).await?))
}

pub async fn view(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectionView>> {
    Ok(Json(state.lifecycle.view(id, user_id).await?))
}

pub async fn accept(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Connection>> {
    Ok(Json(state.lifecycle.accept(id, user_id).await?))
}

pub async fn postpone(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Connection>> {
    Ok(Json(state.lifecycle.postpone(id, user_id).await?))
}

pub async fn decline(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<Connection>> {
    let reason = body.and_then(|Json(req)| req.reason);
    Ok(Json(state.lifecycle.decline(id, user_id, reason.as_deref()).await?))
}

pub async fn dissolve(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<Connection>> {
    let reason = req.reason.unwrap_or_default();
    Ok(Json(state.lifecycle.dissolve(id, user_id, &reason).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>, sort_by: Option<&str>, filter: Option<&str>) -> ListQuery {
        ListQuery {
            status: status.map(String::from),
            sort_by: sort_by.map(String::from),
            filter: filter.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        let (status, filter, sort) = parse_list_query(&ListQuery::default()).unwrap();
        assert_eq!(status, None);
        assert_eq!(filter, ListFilter::All);
        assert_eq!(sort, SortBy::Recent);
    }

    #[test]
    fn test_parses_all_fields() {
        let (status, filter, sort) =
            parse_list_query(&query(Some("active"), Some("Compatibility"), Some("received"))).unwrap();
        assert_eq!(status, Some(ConnectionStatus::Active));
        assert_eq!(filter, ListFilter::Received);
        assert_eq!(sort, SortBy::Compatibility);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(matches!(
            parse_list_query(&query(Some("matched"), None, None)),
            Err(CoreError::Validation(_))
        ));
        assert!(parse_list_query(&query(None, Some("name"), None)).is_err());
        assert!(parse_list_query(&query(None, None, Some("mine"))).is_err());
    }
}
