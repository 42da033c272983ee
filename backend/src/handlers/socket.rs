use std::collections::HashMap;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::handlers::auth::user_from_headers;
use crate::services::lifecycle::load_for_participant;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketQuery {
    /// Browsers cannot set headers on a websocket handshake
    pub user_id: Option<Uuid>,
}

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    #[serde(rename = "presence:join")]
    PresenceJoin { connection_id: Uuid },
    #[serde(rename = "presence:leave")]
    PresenceLeave { connection_id: Uuid },
}

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SocketQuery>,
) -> Result<Response> {
    let user_id = user_from_headers(&headers)
        .or(query.user_id)
        .ok_or(CoreError::Unauthorized("missing or invalid user id"))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

fn error_frame(err: &CoreError) -> String {
    json!({
        "event": "error",
        "data": { "code": err.code(), "message": err.to_string() }
    })
    .to_string()
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe(user_id).await;
    // connection id -> partner id, for leaving on close
    let mut joined: HashMap<Uuid, Uuid> = HashMap::new();

    info!("🔌 Socket opened for {}", user_id);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Socket for {} lagged, {} events dropped", user_id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_frame(&state, user_id, text.as_str(), &mut joined).await {
                        debug!("Socket frame from {} rejected: {}", user_id, e);
                        if sender.send(Message::Text(error_frame(&e).into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Socket error for {}: {}", user_id, e);
                    break;
                }
            },
        }
    }

    for (connection_id, partner_id) in joined {
        state.presence.leave(connection_id, user_id, partner_id).await;
    }
    drop(events);
    state.events.release(user_id).await;
    info!("🔌 Socket closed for {}", user_id);
}

async fn handle_frame(
    state: &AppState,
    user_id: Uuid,
    text: &str,
    joined: &mut HashMap<Uuid, Uuid>,
) -> Result<()> {
    let frame: ClientFrame =
        serde_json::from_str(text).map_err(|e| CoreError::validation(format!("Invalid frame: {}", e)))?;

    match frame {
        ClientFrame::PresenceJoin { connection_id } => {
            let connection = load_for_participant(&state.pool, connection_id, user_id).await?;
            let partner_id = connection
                .partner_of(user_id)
                .ok_or(CoreError::Unauthorized("you are not part of this connection"))?;
            // Each socket counts once per nucleus
            if joined.insert(connection_id, partner_id).is_none() {
                state.presence.join(connection_id, user_id, partner_id).await;
            }
        }
        ClientFrame::PresenceLeave { connection_id } => {
            if let Some(partner_id) = joined.remove(&connection_id) {
                state.presence.leave(connection_id, user_id, partner_id).await;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_presence_frames() {
        let id = Uuid::new_v4();
        let frame: ClientFrame = serde_json::from_value(json!({
            "event": "presence:join",
            "data": { "connectionId": id }
        }))
        .unwrap();
        assert_eq!(frame, ClientFrame::PresenceJoin { connection_id: id });

        let frame: ClientFrame = serde_json::from_value(json!({
            "event": "presence:leave",
            "data": { "connectionId": id }
        }))
        .unwrap();
        assert_eq!(frame, ClientFrame::PresenceLeave { connection_id: id });
    }

    #[test]
    fn test_unknown_frame_is_rejected() {
        let result = serde_json::from_value::<ClientFrame>(json!({ "event": "typing", "data": {} }));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_frame_shape() {
        let frame: serde_json::Value = serde_json::from_str(&error_frame(&CoreError::NotFound("connection"))).unwrap();
        assert_eq!(frame["event"], "error");
        assert_eq!(frame["data"]["code"], "NOT_FOUND");
    }
}
