use sqlx::PgPool;

use crate::services::{
    ActivityLedger, ChatService, ConnectionLifecycle, EventHub, MissionBoard, NucleusActivities, PlaceBoard,
    PresenceNotifier, SweepPolicy, Sweeper,
};
use crate::utils::Config;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub events: EventHub,
    pub presence: PresenceNotifier,
    pub lifecycle: ConnectionLifecycle,
    pub ledger: ActivityLedger,
    pub nucleus: NucleusActivities,
    pub places: PlaceBoard,
    pub chat: ChatService,
    pub missions: MissionBoard,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let events = EventHub::new();
        let presence = PresenceNotifier::new(events.clone());
        let ledger = ActivityLedger::new(pool.clone(), events.clone());

        Self {
            lifecycle: ConnectionLifecycle::new(pool.clone(), events.clone()),
            nucleus: NucleusActivities::new(ledger.clone()),
            places: PlaceBoard::new(pool.clone(), ledger.clone(), events.clone()),
            chat: ChatService::new(pool.clone(), events.clone()),
            missions: MissionBoard::new(pool.clone(), events.clone(), config.mission_duration_days),
            ledger,
            pool,
            config,
            events,
            presence,
        }
    }

    /// Sweeper sharing this state's event hub, so its hints reach connected sockets
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(self.pool.clone(), self.events.clone(), SweepPolicy::from_config(&self.config))
    }
}
