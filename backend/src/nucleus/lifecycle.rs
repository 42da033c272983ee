//! Connection state machine.
//!
//! ```text
//! PENDING --accept--> ACTIVE        LATER --accept--> ACTIVE
//! PENDING --postpone--> LATER       LATER --decline--> ENDED
//! PENDING --decline--> ENDED        ACTIVE --complete--> COMPLETED
//! ACTIVE/COMPLETED --dissolve--> ENDED
//! ACTIVE/LATER --cool--> COOLED --expire--> ENDED
//! COOLED from ACTIVE: --revive--> ACTIVE, --dissolve--> ENDED
//! COOLED from LATER: --accept--> ACTIVE, --decline--> ENDED
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{DISSOLVE_MIN_WORDS, REASON_MAX_CHARS};
use crate::error::{CoreError, Result};
use crate::models::{ConnectionStatus, ParticipantRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Accept,
    Postpone,
    Decline,
    Dissolve,
    /// Progress reached 100
    Complete,
    /// Idle for too long
    Cool,
    /// Renewed activity on a cooled connection
    Revive,
    /// Cooled for too long
    Expire,
}

impl LifecycleAction {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Postpone => "postpone",
            Self::Decline => "decline",
            Self::Dissolve => "dissolve",
            Self::Complete => "complete",
            Self::Cool => "cool",
            Self::Revive => "revive",
            Self::Expire => "expire",
        }
    }
}

/// Compute the status an action leads to, or reject it.
///
/// `role` is the acting participant; system-driven actions pass `None`.
pub fn next_status(
    current: ConnectionStatus,
    cooled_from: Option<ConnectionStatus>,
    action: LifecycleAction,
    role: Option<ParticipantRole>,
) -> Result<ConnectionStatus> {
    use ConnectionStatus::*;

    let receiver = role == Some(ParticipantRole::Receiver);
    let participant = role.is_some();

    let next = match (action, current) {
        (LifecycleAction::Accept, Pending | Later) if receiver => Some(Active),
        (LifecycleAction::Accept, Cooled) if receiver && cooled_from == Some(Later) => Some(Active),
        (LifecycleAction::Postpone, Pending) if receiver => Some(Later),
        (LifecycleAction::Decline, Pending | Later) if participant => Some(Ended),
        (LifecycleAction::Decline, Cooled) if participant && cooled_from == Some(Later) => Some(Ended),
        (LifecycleAction::Dissolve, Active | Completed) if participant => Some(Ended),
        (LifecycleAction::Dissolve, Cooled) if participant && cooled_from == Some(Active) => Some(Ended),
        (LifecycleAction::Complete, Active) => Some(Completed),
        (LifecycleAction::Cool, Active | Later) => Some(Cooled),
        (LifecycleAction::Revive, Cooled) if cooled_from == Some(Active) => Some(Active),
        (LifecycleAction::Expire, Cooled) => Some(Ended),
        _ => None,
    };

    next.ok_or(CoreError::InvalidTransition {
        action: action.verb(),
        status: current,
    })
}

/// Whether nucleus activity and chat are open for this status
pub fn accepts_activity(status: ConnectionStatus, cooled_from: Option<ConnectionStatus>) -> bool {
    match status {
        ConnectionStatus::Active | ConnectionStatus::Completed => true,
        ConnectionStatus::Cooled => cooled_from == Some(ConnectionStatus::Active),
        _ => false,
    }
}

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*").expect("word pattern is valid")
});

/// Count words, ignoring stray punctuation and emoji
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Dissolving requires an explanation the other person will read.
pub fn validate_dissolve_reason(reason: &str) -> Result<String> {
    let reason = reason.trim();
    if reason.chars().count() > REASON_MAX_CHARS {
        return Err(CoreError::validation(format!(
            "Reason must be at most {} characters",
            REASON_MAX_CHARS
        )));
    }

    let words = word_count(reason);
    if words < DISSOLVE_MIN_WORDS {
        return Err(CoreError::validation(format!(
            "Reason must contain at least {} words (got {})",
            DISSOLVE_MIN_WORDS, words
        )));
    }

    Ok(reason.to_string())
}

pub fn validate_decline_reason(reason: Option<&str>) -> Result<Option<String>> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if reason.chars().count() > REASON_MAX_CHARS {
        return Err(CoreError::validation(format!(
            "Reason must be at most {} characters",
            REASON_MAX_CHARS
        )));
    }

    Ok(Some(reason.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionStatus::*;
    use LifecycleAction::*;

    const RECEIVER: Option<ParticipantRole> = Some(ParticipantRole::Receiver);
    const INITIATOR: Option<ParticipantRole> = Some(ParticipantRole::Initiator);

    #[test]
    fn test_legal_edges() {
        assert_eq!(next_status(Pending, None, Accept, RECEIVER).unwrap(), Active);
        assert_eq!(next_status(Pending, None, Postpone, RECEIVER).unwrap(), Later);
        assert_eq!(next_status(Pending, None, Decline, RECEIVER).unwrap(), Ended);
        assert_eq!(next_status(Later, None, Accept, RECEIVER).unwrap(), Active);
        assert_eq!(next_status(Later, None, Decline, RECEIVER).unwrap(), Ended);
        assert_eq!(next_status(Active, None, Complete, None).unwrap(), Completed);
        assert_eq!(next_status(Active, None, Dissolve, INITIATOR).unwrap(), Ended);
        assert_eq!(next_status(Completed, None, Dissolve, RECEIVER).unwrap(), Ended);
    }

    #[test]
    fn test_cooling_edges() {
        assert_eq!(next_status(Active, None, Cool, None).unwrap(), Cooled);
        assert_eq!(next_status(Later, None, Cool, None).unwrap(), Cooled);
        assert_eq!(next_status(Cooled, Some(Active), Revive, None).unwrap(), Active);
        assert_eq!(next_status(Cooled, Some(Later), Accept, RECEIVER).unwrap(), Active);
        assert_eq!(next_status(Cooled, Some(Active), Expire, None).unwrap(), Ended);
        assert_eq!(next_status(Cooled, Some(Later), Decline, INITIATOR).unwrap(), Ended);
        assert_eq!(next_status(Cooled, Some(Active), Dissolve, INITIATOR).unwrap(), Ended);
        assert_eq!(next_status(Cooled, Some(Active), Dissolve, RECEIVER).unwrap(), Ended);

        // An idle match is still a match: ending it needs a dissolve reason
        assert!(next_status(Cooled, Some(Active), Decline, INITIATOR).is_err());
        assert!(next_status(Cooled, Some(Active), Decline, RECEIVER).is_err());
        assert!(next_status(Cooled, Some(Later), Dissolve, RECEIVER).is_err());
        assert!(next_status(Cooled, Some(Active), Dissolve, None).is_err());

        assert!(next_status(Cooled, Some(Later), Revive, None).is_err());
        assert!(next_status(Cooled, Some(Active), Accept, RECEIVER).is_err());
        assert!(next_status(Completed, None, Cool, None).is_err());
    }

    #[test]
    fn test_initiator_cannot_accept_or_postpone() {
        assert!(next_status(Pending, None, Accept, INITIATOR).is_err());
        assert!(next_status(Pending, None, Postpone, INITIATOR).is_err());
        // Withdrawing a request is a decline
        assert_eq!(next_status(Pending, None, Decline, INITIATOR).unwrap(), Ended);
    }

    #[test]
    fn test_terminal_status_rejects_everything() {
        for action in [Accept, Postpone, Decline, Dissolve, Complete, Cool, Revive, Expire] {
            let err = next_status(Ended, None, action, RECEIVER).unwrap_err();
            match err {
                CoreError::InvalidTransition { status, .. } => assert_eq!(status, Ended),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_illegal_edges() {
        assert!(next_status(Later, None, Postpone, RECEIVER).is_err());
        assert!(next_status(Active, None, Accept, RECEIVER).is_err());
        assert!(next_status(Active, None, Decline, RECEIVER).is_err());
        assert!(next_status(Pending, None, Dissolve, RECEIVER).is_err());
        assert!(next_status(Later, None, Complete, None).is_err());
        assert!(next_status(Completed, None, Complete, None).is_err());
        // System actions never come from an outsider-acting user path
        assert!(next_status(Pending, None, Decline, None).is_err());
    }

    #[test]
    fn test_accepts_activity() {
        assert!(accepts_activity(Active, None));
        assert!(accepts_activity(Completed, None));
        assert!(accepts_activity(Cooled, Some(Active)));
        assert!(!accepts_activity(Cooled, Some(Later)));
        assert!(!accepts_activity(Pending, None));
        assert!(!accepts_activity(Later, None));
        assert!(!accepts_activity(Ended, None));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  hello   world  "), 2);
        assert_eq!(word_count("it's a well-known fact - really!"), 5);
        assert_eq!(word_count("... --- !!!"), 0);
        assert_eq!(word_count("canción día año"), 3);
    }

    #[test]
    fn test_dissolve_reason_needs_twenty_words() {
        let nineteen = vec!["word"; 19].join(" ");
        let twenty = vec!["word"; 20].join(" ");

        assert!(matches!(
            validate_dissolve_reason(&nineteen),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(validate_dissolve_reason(&format!("  {}  ", twenty)).unwrap(), twenty);
    }

    #[test]
    fn test_dissolve_reason_punctuation_does_not_count() {
        let padded = format!("{} {}", vec!["word"; 15].join(" "), vec!["-"; 10].join(" "));
        assert!(validate_dissolve_reason(&padded).is_err());
    }

    #[test]
    fn test_decline_reason_is_optional() {
        assert_eq!(validate_decline_reason(None).unwrap(), None);
        assert_eq!(validate_decline_reason(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_decline_reason(Some(" not ready ")).unwrap(),
            Some("not ready".to_string())
        );
        assert!(validate_decline_reason(Some(&"x".repeat(REASON_MAX_CHARS + 1))).is_err());
    }
}
