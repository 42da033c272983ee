use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::nucleus::{chat_gate, temperature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "connection_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Pending,
    Later,
    Active,
    Completed,
    Cooled,
    Ended,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Later => "LATER",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cooled => "COOLED",
            Self::Ended => "ENDED",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "LATER" => Ok(Self::Later),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "COOLED" => Ok(Self::Cooled),
            "ENDED" => Ok(Self::Ended),
            other => Err(format!("unknown connection status: {}", other)),
        }
    }
}

/// How an ENDED connection got there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "end_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndKind {
    Declined,
    Dissolved,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatLevel {
    None,
    Limited,
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Temperature {
    Hot,
    Warm,
    Cool,
    Cold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Initiator,
    Receiver,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Uuid,
    pub initiator_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
    pub cooled_from: Option<ConnectionStatus>,
    pub progress: i32,
    pub compatibility_score: i32,
    pub seen_by_receiver: bool,
    pub end_kind: Option<EndKind>,
    pub ended_by: Option<Uuid>,
    pub end_reason: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Always derived from progress, never stored
    pub fn chat_level(&self) -> ChatLevel {
        chat_gate::chat_level(self.progress)
    }

    pub fn temperature(&self, now: DateTime<Utc>) -> Temperature {
        temperature::from_last_activity(self.last_activity, now)
    }

    pub fn role_of(&self, user_id: Uuid) -> Option<ParticipantRole> {
        if user_id == self.initiator_id {
            Some(ParticipantRole::Initiator)
        } else if user_id == self.receiver_id {
            Some(ParticipantRole::Receiver)
        } else {
            None
        }
    }

    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        match self.role_of(user_id)? {
            ParticipantRole::Initiator => Some(self.receiver_id),
            ParticipantRole::Receiver => Some(self.initiator_id),
        }
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.initiator_id, self.receiver_id]
    }

    /// Render the connection from one participant's point of view
    pub fn view_for(&self, viewer: Uuid, now: DateTime<Utc>) -> ConnectionView {
        ConnectionView {
            id: self.id,
            partner_id: self.partner_of(viewer).unwrap_or(self.receiver_id),
            status: self.status,
            progress: self.progress,
            chat_level: self.chat_level(),
            temperature: self.temperature(now),
            compatibility_score: self.compatibility_score,
            is_initiator: viewer == self.initiator_id,
            seen_by_receiver: self.seen_by_receiver,
            end_kind: self.end_kind,
            end_reason: self.end_reason.clone(),
            ended_by_viewer: self.ended_by == Some(viewer),
            last_activity: self.last_activity,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub status: ConnectionStatus,
    pub progress: i32,
    pub chat_level: ChatLevel,
    pub temperature: Temperature,
    pub compatibility_score: i32,
    pub is_initiator: bool,
    pub seen_by_receiver: bool,
    pub end_kind: Option<EndKind>,
    pub end_reason: Option<String>,
    pub ended_by_viewer: bool,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_connection(status: ConnectionStatus, progress: i32) -> Connection {
    let now = Utc::now();
    Connection {
        id: Uuid::new_v4(),
        initiator_id: Uuid::new_v4(),
        receiver_id: Uuid::new_v4(),
        status,
        cooled_from: None,
        progress,
        compatibility_score: 50,
        seen_by_receiver: false,
        end_kind: None,
        ended_by: None,
        end_reason: None,
        last_activity: now,
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}
