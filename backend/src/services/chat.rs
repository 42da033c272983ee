use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::MESSAGE_PAGE_LIMIT;
use crate::db::{connections, messages};
use crate::error::Result;
use crate::models::{ConnectionStatus, Message};
use crate::nucleus::chat_gate;
use crate::nucleus::lifecycle::LifecycleAction;
use crate::services::events::{EventHub, SocketEvent};
use crate::services::lifecycle::{apply_system, load_for_participant, lock_for_participant};

/// Messaging between participants, gated by chat level.
#[derive(Clone)]
pub struct ChatService {
    pool: PgPool,
    events: EventHub,
}

impl ChatService {
    pub fn new(pool: PgPool, events: EventHub) -> Self {
        Self { pool, events }
    }

    pub async fn send(&self, connection_id: Uuid, sender_id: Uuid, body: &str) -> Result<Message> {
        let mut tx = self.pool.begin().await?;
        let (connection, _) = lock_for_participant(&mut tx, connection_id, sender_id).await?;
        let body = chat_gate::check_message(&connection, body)?;

        if connection.status == ConnectionStatus::Cooled {
            apply_system(&mut tx, &connection, LifecycleAction::Revive).await?;
            info!("Connection {} revived by a message", connection_id);
        } else {
            connections::touch_activity(&mut *tx, connection_id).await?;
        }
        let message = messages::insert_message(&mut *tx, connection_id, sender_id, &body).await?;
        tx.commit().await?;

        debug!("Message {} stored on connection {}", message.id, connection_id);
        if let Some(partner_id) = connection.partner_of(sender_id) {
            self.events
                .emit(
                    partner_id,
                    SocketEvent::NewMessage {
                        connection_id,
                        message_id: message.id,
                    },
                )
                .await;
        }
        Ok(message)
    }

    /// Latest page of the conversation, oldest first
    pub async fn list(&self, connection_id: Uuid, viewer: Uuid) -> Result<Vec<Message>> {
        load_for_participant(&self.pool, connection_id, viewer).await?;
        messages::list_messages(&self.pool, connection_id, MESSAGE_PAGE_LIMIT).await
    }
}
