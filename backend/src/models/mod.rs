pub mod activities;
pub mod connections;
pub mod messages;
pub mod missions;
pub mod places;
pub mod users;

pub use activities::{ActivityCategory, ActivityPayload, ActivityRecord, AnswerPayload, GamePayload};
pub use connections::{ChatLevel, Connection, ConnectionStatus, ConnectionView, EndKind, ParticipantRole, Temperature};
pub use messages::Message;
pub use missions::{MissionResponse, MissionRound, MissionStatus, MissionVote};
pub use places::{PlaceStatus, PlaceSuggestion, PlaceVote};
pub use users::UserProfile;
