use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::models::ChatLevel;

/// Server-to-client socket events. Payloads are invalidation hints: clients
/// re-fetch the affected resource instead of trusting the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum SocketEvent {
    #[serde(rename = "connection-request")]
    ConnectionRequest { connection_id: Uuid, from_user_id: Uuid },
    #[serde(rename = "connection-accepted")]
    ConnectionAccepted { connection_id: Uuid, by_user_id: Uuid },
    #[serde(rename = "nucleus:updated")]
    NucleusUpdated { connection_id: Uuid },
    #[serde(rename = "nucleus:dissolved")]
    NucleusDissolved { connection_id: Uuid, by_user_id: Uuid },
    #[serde(rename = "progress-update")]
    ProgressUpdate { connection_id: Uuid, progress: i32, chat_level: ChatLevel },
    #[serde(rename = "presence:joined")]
    PresenceJoined { connection_id: Uuid, user_id: Uuid },
    #[serde(rename = "presence:left")]
    PresenceLeft { connection_id: Uuid, user_id: Uuid },
    #[serde(rename = "new-message")]
    NewMessage { connection_id: Uuid, message_id: Uuid },
}

impl SocketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionRequest { .. } => "connection-request",
            Self::ConnectionAccepted { .. } => "connection-accepted",
            Self::NucleusUpdated { .. } => "nucleus:updated",
            Self::NucleusDissolved { .. } => "nucleus:dissolved",
            Self::ProgressUpdate { .. } => "progress-update",
            Self::PresenceJoined { .. } => "presence:joined",
            Self::PresenceLeft { .. } => "presence:left",
            Self::NewMessage { .. } => "new-message",
        }
    }
}

/// Per-user fan-out of socket events. Only call `emit` after the state
/// change it describes has committed.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    channels: Arc<RwLock<HashMap<Uuid, broadcast::Sender<SocketEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<SocketEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drop the user's channel once no socket listens to it anymore
    pub async fn release(&self, user_id: Uuid) {
        let mut channels = self.channels.write().await;
        if channels.get(&user_id).is_some_and(|tx| tx.receiver_count() == 0) {
            channels.remove(&user_id);
        }
    }

    /// Deliver to every open socket of the user. Offline users simply miss the
    /// hint and re-fetch when they reconnect.
    pub async fn emit(&self, user_id: Uuid, event: SocketEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(&user_id) {
            Some(tx) => {
                tracing::debug!("Emitting {} to {}", event.name(), user_id);
                tx.send(event).unwrap_or(0)
            }
            None => 0,
        }
    }

    pub async fn emit_all(&self, user_ids: &[Uuid], event: SocketEvent) {
        for user_id in user_ids {
            self.emit(*user_id, event.clone()).await;
        }
    }

    pub async fn online(&self, user_id: Uuid) -> bool {
        let channels = self.channels.read().await;
        channels.get(&user_id).is_some_and(|tx| tx.receiver_count() > 0)
    }
}
