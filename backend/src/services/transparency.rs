use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Connection, ConnectionStatus, ConnectionView, EndKind};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyStats {
    pub who_liked_you: usize,
    pub who_you_liked: usize,
    pub active_matches: usize,
    pub rejections: usize,
    pub postponed: usize,
    pub dissolved: usize,
    pub total: usize,
}

/// Everything that ever happened between the viewer and other people.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyView {
    pub who_liked_you: Vec<ConnectionView>,
    pub who_you_liked: Vec<ConnectionView>,
    pub active_matches: Vec<ConnectionView>,
    pub rejections: Vec<ConnectionView>,
    pub postponed: Vec<ConnectionView>,
    pub dissolved: Vec<ConnectionView>,
    pub stats: TransparencyStats,
}

pub fn build(connections: &[Connection], viewer: Uuid, now: DateTime<Utc>) -> TransparencyView {
    let mut view = TransparencyView::default();

    for connection in connections {
        if connection.role_of(viewer).is_none() {
            continue;
        }
        let item = connection.view_for(viewer, now);

        let bucket = match (connection.status, connection.end_kind) {
            (ConnectionStatus::Pending, _) if item.is_initiator => &mut view.who_you_liked,
            (ConnectionStatus::Pending, _) => &mut view.who_liked_you,
            (ConnectionStatus::Later, _) => &mut view.postponed,
            (ConnectionStatus::Cooled, _) if connection.cooled_from == Some(ConnectionStatus::Later) => {
                &mut view.postponed
            }
            (ConnectionStatus::Active | ConnectionStatus::Completed | ConnectionStatus::Cooled, _) => {
                &mut view.active_matches
            }
            (ConnectionStatus::Ended, Some(EndKind::Declined)) => &mut view.rejections,
            (ConnectionStatus::Ended, Some(EndKind::Dissolved)) => &mut view.dissolved,
            // Expired connections only count toward the total
            (ConnectionStatus::Ended, _) => {
                view.stats.total += 1;
                continue;
            }
        };
        bucket.push(item);
        view.stats.total += 1;
    }

    view.stats.who_liked_you = view.who_liked_you.len();
    view.stats.who_you_liked = view.who_you_liked.len();
    view.stats.active_matches = view.active_matches.len();
    view.stats.rejections = view.rejections.len();
    view.stats.postponed = view.postponed.len();
    view.stats.dissolved = view.dissolved.len();
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::connections::sample_connection;

    #[test]
    fn test_buckets_by_status_and_side() {
        let viewer = Uuid::new_v4();
        let mut liked_me = sample_connection(ConnectionStatus::Pending, 0);
        liked_me.receiver_id = viewer;

        let mut i_liked = sample_connection(ConnectionStatus::Pending, 0);
        i_liked.initiator_id = viewer;

        let mut active = sample_connection(ConnectionStatus::Cooled, 40);
        active.initiator_id = viewer;
        active.cooled_from = Some(ConnectionStatus::Active);

        let mut postponed = sample_connection(ConnectionStatus::Later, 0);
        postponed.receiver_id = viewer;

        let mut rejected = sample_connection(ConnectionStatus::Ended, 0);
        rejected.receiver_id = viewer;
        rejected.end_kind = Some(EndKind::Declined);
        rejected.ended_by = Some(viewer);

        let mut dissolved = sample_connection(ConnectionStatus::Ended, 80);
        dissolved.initiator_id = viewer;
        dissolved.end_kind = Some(EndKind::Dissolved);
        dissolved.end_reason = Some("reason".into());

        let mut expired = sample_connection(ConnectionStatus::Ended, 10);
        expired.initiator_id = viewer;
        expired.end_kind = Some(EndKind::Expired);

        let stranger = sample_connection(ConnectionStatus::Active, 10);

        let view = build(
            &[liked_me, i_liked, active, postponed, rejected, dissolved, expired, stranger],
            viewer,
            Utc::now(),
        );

        assert_eq!(view.stats.who_liked_you, 1);
        assert_eq!(view.stats.who_you_liked, 1);
        assert_eq!(view.stats.active_matches, 1);
        assert_eq!(view.stats.postponed, 1);
        assert_eq!(view.stats.rejections, 1);
        assert_eq!(view.stats.dissolved, 1);
        assert_eq!(view.stats.total, 7);
        assert!(view.rejections[0].ended_by_viewer);
        assert_eq!(view.dissolved[0].end_reason.as_deref(), Some("reason"));
    }

    #[test]
    fn test_cooled_request_stays_postponed() {
        let viewer = Uuid::new_v4();
        let mut request = sample_connection(ConnectionStatus::Cooled, 0);
        request.receiver_id = viewer;
        request.cooled_from = Some(ConnectionStatus::Later);

        let view = build(&[request], viewer, Utc::now());
        assert_eq!(view.stats.postponed, 1);
        assert_eq!(view.stats.active_matches, 0);
    }

    #[test]
    fn test_empty_history() {
        let view = build(&[], Uuid::new_v4(), Utc::now());
        assert_eq!(view.stats.total, 0);
        assert!(view.active_matches.is_empty());
    }
}
