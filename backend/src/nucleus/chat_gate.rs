use crate::constants::{
    CHAT_LIMITED_THRESHOLD, CHAT_UNLIMITED_THRESHOLD, LIMITED_MESSAGE_MAX_CHARS,
    UNLIMITED_MESSAGE_MAX_CHARS,
};
use crate::error::{CoreError, Result};
use crate::models::{ChatLevel, Connection};
use crate::nucleus::lifecycle;

/// Chat level is a pure function of progress.
pub fn chat_level(progress: i32) -> ChatLevel {
    if progress < CHAT_LIMITED_THRESHOLD {
        ChatLevel::None
    } else if progress < CHAT_UNLIMITED_THRESHOLD {
        ChatLevel::Limited
    } else {
        ChatLevel::Unlimited
    }
}

pub fn can_send_message(connection: &Connection) -> bool {
    connection.chat_level() != ChatLevel::None
}

pub fn max_message_chars(level: ChatLevel) -> usize {
    match level {
        ChatLevel::None => 0,
        ChatLevel::Limited => LIMITED_MESSAGE_MAX_CHARS,
        ChatLevel::Unlimited => UNLIMITED_MESSAGE_MAX_CHARS,
    }
}

/// Gate a message before it is stored. Returns the trimmed body.
pub fn check_message(connection: &Connection, body: &str) -> Result<String> {
    if !lifecycle::accepts_activity(connection.status, connection.cooled_from) {
        return Err(CoreError::InvalidTransition {
            action: "send a message on",
            status: connection.status,
        });
    }

    if !can_send_message(connection) {
        return Err(CoreError::ChatLocked {
            progress: connection.progress,
            threshold: CHAT_LIMITED_THRESHOLD,
        });
    }

    let body = body.trim();
    if body.is_empty() {
        return Err(CoreError::validation("Message cannot be empty"));
    }

    let max = max_message_chars(connection.chat_level());
    if body.chars().count() > max {
        return Err(CoreError::validation(format!(
            "Message must be at most {} characters at this chat level",
            max
        )));
    }

    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionStatus;
    use crate::models::connections::sample_connection;

    #[test]
    fn test_thresholds() {
        assert_eq!(chat_level(0), ChatLevel::None);
        assert_eq!(chat_level(69), ChatLevel::None);
        assert_eq!(chat_level(70), ChatLevel::Limited);
        assert_eq!(chat_level(99), ChatLevel::Limited);
        assert_eq!(chat_level(100), ChatLevel::Unlimited);
    }

    #[test]
    fn test_chat_level_follows_progress() {
        let mut conn = sample_connection(ConnectionStatus::Active, 0);
        for progress in [0, 69, 70, 99, 100] {
            conn.progress = progress;
            assert_eq!(conn.chat_level(), chat_level(progress));
            assert_eq!(can_send_message(&conn), progress >= 70);
        }
    }

    #[test]
    fn test_locked_chat_rejects_message() {
        let conn = sample_connection(ConnectionStatus::Active, 69);
        match check_message(&conn, "hi") {
            Err(CoreError::ChatLocked { progress, threshold }) => {
                assert_eq!(progress, 69);
                assert_eq!(threshold, 70);
            }
            other => panic!("expected ChatLocked, got {other:?}"),
        }
    }

    #[test]
    fn test_limited_chat_caps_length() {
        let conn = sample_connection(ConnectionStatus::Active, 75);
        assert_eq!(check_message(&conn, "  hello  ").unwrap(), "hello");
        assert!(check_message(&conn, &"a".repeat(LIMITED_MESSAGE_MAX_CHARS + 1)).is_err());

        let unlimited = sample_connection(ConnectionStatus::Completed, 100);
        assert!(check_message(&unlimited, &"a".repeat(LIMITED_MESSAGE_MAX_CHARS + 1)).is_ok());
    }

    #[test]
    fn test_empty_message_rejected() {
        let conn = sample_connection(ConnectionStatus::Active, 100);
        assert!(matches!(check_message(&conn, "   "), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_message_needs_open_connection() {
        let conn = sample_connection(ConnectionStatus::Ended, 100);
        assert!(matches!(
            check_message(&conn, "hello"),
            Err(CoreError::InvalidTransition { .. })
        ));
    }
}
