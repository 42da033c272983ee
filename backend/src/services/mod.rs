pub mod chat;
pub mod compatibility;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod maintenance;
pub mod missions;
pub mod nucleus;
pub mod places;
pub mod presence;
pub mod transparency;

pub use chat::ChatService;
pub use events::{EventHub, SocketEvent};
pub use ledger::{ActivityLedger, NucleusOverview, SubmissionOutcome};
pub use lifecycle::ConnectionLifecycle;
pub use maintenance::{SweepPolicy, SweepReport, Sweeper};
pub use missions::MissionBoard;
pub use nucleus::NucleusActivities;
pub use places::PlaceBoard;
pub use presence::PresenceNotifier;
