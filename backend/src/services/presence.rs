use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::services::events::{EventHub, SocketEvent};

/// connection id -> user id -> open sockets viewing it
type ViewerMap = HashMap<Uuid, HashMap<Uuid, usize>>;

/// Who is currently looking at which nucleus. Volatile: lost on restart.
///
/// A user may view the same nucleus from several sockets; the partner hears
/// about the first join and the last leave only.
#[derive(Debug, Clone)]
pub struct PresenceNotifier {
    viewers: Arc<Mutex<ViewerMap>>,
    events: EventHub,
}

impl PresenceNotifier {
    pub fn new(events: EventHub) -> Self {
        Self {
            viewers: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Count one more socket for the user and tell the partner if it is the first.
    /// Returns false when the user was already there.
    pub async fn join(&self, connection_id: Uuid, user_id: Uuid, partner_id: Uuid) -> bool {
        let first = {
            let mut map = self.viewers.lock().await;
            let sockets = map.entry(connection_id).or_default().entry(user_id).or_insert(0);
            *sockets += 1;
            *sockets == 1
        };

        if first {
            tracing::debug!("User {} joined nucleus {}", user_id, connection_id);
            self.events
                .emit(partner_id, SocketEvent::PresenceJoined { connection_id, user_id })
                .await;
        }
        first
    }

    /// Drop one socket for the user. Returns true when it was their last one.
    pub async fn leave(&self, connection_id: Uuid, user_id: Uuid, partner_id: Uuid) -> bool {
        let last = {
            let mut map = self.viewers.lock().await;
            let Some(users) = map.get_mut(&connection_id) else {
                return false;
            };
            let Some(sockets) = users.get_mut(&user_id) else {
                return false;
            };
            *sockets -= 1;
            let last = *sockets == 0;
            if last {
                users.remove(&user_id);
            }
            if users.is_empty() {
                map.remove(&connection_id);
            }
            last
        };

        if last {
            tracing::debug!("User {} left nucleus {}", user_id, connection_id);
            self.events
                .emit(partner_id, SocketEvent::PresenceLeft { connection_id, user_id })
                .await;
        }
        last
    }

    pub async fn viewers(&self, connection_id: Uuid) -> Vec<Uuid> {
        let map = self.viewers.lock().await;
        map.get(&connection_id)
            .map(|users| users.keys().copied().collect())
            .unwrap_or_default()
    }

    pub async fn is_viewing(&self, connection_id: Uuid, user_id: Uuid) -> bool {
        let map = self.viewers.lock().await;
        map.get(&connection_id).is_some_and(|users| users.contains_key(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_and_leave_notify_partner() {
        let events = EventHub::new();
        let presence = PresenceNotifier::new(events.clone());
        let (conn, alice, bob) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut bob_rx = events.subscribe(bob).await;

        assert!(presence.join(conn, alice, bob).await);
        assert_eq!(
            bob_rx.recv().await.unwrap(),
            SocketEvent::PresenceJoined { connection_id: conn, user_id: alice }
        );
        assert!(presence.is_viewing(conn, alice).await);

        assert!(presence.leave(conn, alice, bob).await);
        assert_eq!(
            bob_rx.recv().await.unwrap(),
            SocketEvent::PresenceLeft { connection_id: conn, user_id: alice }
        );
        assert!(presence.viewers(conn).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_join_is_silent() {
        let events = EventHub::new();
        let presence = PresenceNotifier::new(events.clone());
        let (conn, alice, bob) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut bob_rx = events.subscribe(bob).await;

        assert!(presence.join(conn, alice, bob).await);
        assert!(!presence.join(conn, alice, bob).await);
        assert!(!presence.leave(conn, bob, alice).await);

        bob_rx.recv().await.unwrap();
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_socket_keeps_user_present() {
        let events = EventHub::new();
        let presence = PresenceNotifier::new(events.clone());
        let (conn, alice, bob) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut bob_rx = events.subscribe(bob).await;

        // Phone and laptop both open the nucleus
        presence.join(conn, alice, bob).await;
        presence.join(conn, alice, bob).await;
        bob_rx.recv().await.unwrap();

        assert!(!presence.leave(conn, alice, bob).await);
        assert!(presence.is_viewing(conn, alice).await);
        assert!(bob_rx.try_recv().is_err());

        assert!(presence.leave(conn, alice, bob).await);
        assert_eq!(
            bob_rx.recv().await.unwrap(),
            SocketEvent::PresenceLeft { connection_id: conn, user_id: alice }
        );
        assert!(!presence.is_viewing(conn, alice).await);
        assert!(!presence.leave(conn, alice, bob).await);
    }

    #[tokio::test]
    async fn test_both_viewers_tracked() {
        let presence = PresenceNotifier::new(EventHub::new());
        let (conn, alice, bob) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        presence.join(conn, alice, bob).await;
        presence.join(conn, bob, alice).await;

        let mut viewers = presence.viewers(conn).await;
        viewers.sort();
        let mut expected = vec![alice, bob];
        expected.sort();
        assert_eq!(viewers, expected);
    }
}
