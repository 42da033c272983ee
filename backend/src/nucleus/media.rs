//! Photo and voice exchange. Files live in external storage; only references land here.

use serde::Serialize;

use crate::constants::{
    MEDIA_URL_MAX_CHARS, PHOTO_CAPTION_MAX_CHARS, PHOTO_SLOTS, VOICE_MAX_SECS, VOICE_MIN_SECS,
};
use crate::error::{CoreError, Result};
use crate::models::ActivityPayload;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePrompt {
    pub id: &'static str,
    pub prompt: &'static str,
}

pub static VOICE_PROMPTS: &[VoicePrompt] = &[
    VoicePrompt { id: "voice-intro", prompt: "Say hi and tell them how your day went" },
    VoicePrompt { id: "voice-story", prompt: "Tell a short story you always come back to" },
];

pub fn photo_key(slot: i32) -> String {
    format!("slot-{}", slot)
}

fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(CoreError::validation("Media url must be an http(s) url"));
    }
    if url.len() > MEDIA_URL_MAX_CHARS {
        return Err(CoreError::validation("Media url is too long"));
    }
    Ok(url.to_string())
}

/// Returns the ledger key and normalized payload for a photo
pub fn validate_photo(slot: i32, url: &str, caption: Option<&str>) -> Result<(String, ActivityPayload)> {
    if !(1..=PHOTO_SLOTS).contains(&slot) {
        return Err(CoreError::validation(format!("Photo slot must be between 1 and {}", PHOTO_SLOTS)));
    }

    let caption = caption.map(str::trim).filter(|c| !c.is_empty());
    if caption.is_some_and(|c| c.chars().count() > PHOTO_CAPTION_MAX_CHARS) {
        return Err(CoreError::validation(format!(
            "Caption must be at most {} characters",
            PHOTO_CAPTION_MAX_CHARS
        )));
    }

    Ok((
        photo_key(slot),
        ActivityPayload::Photo {
            url: validate_url(url)?,
            caption: caption.map(str::to_string),
        },
    ))
}

/// Returns the ledger key and normalized payload for a voice note
pub fn validate_voice(prompt_id: &str, url: &str, duration_secs: i32) -> Result<(String, ActivityPayload)> {
    let prompt = VOICE_PROMPTS
        .iter()
        .find(|p| p.id == prompt_id)
        .ok_or(CoreError::NotFound("voice prompt"))?;

    if !(VOICE_MIN_SECS..=VOICE_MAX_SECS).contains(&duration_secs) {
        return Err(CoreError::validation(format!(
            "Voice notes must last between {} and {} seconds",
            VOICE_MIN_SECS, VOICE_MAX_SECS
        )));
    }

    Ok((
        prompt.id.to_string(),
        ActivityPayload::Voice { url: validate_url(url)?, duration_secs },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_slots() {
        let (key, payload) = validate_photo(2, " https://cdn.example/p.jpg ", Some("  me  ")).unwrap();
        assert_eq!(key, "slot-2");
        assert_eq!(
            payload,
            ActivityPayload::Photo { url: "https://cdn.example/p.jpg".into(), caption: Some("me".into()) }
        );

        assert!(validate_photo(0, "https://cdn.example/p.jpg", None).is_err());
        assert!(validate_photo(PHOTO_SLOTS + 1, "https://cdn.example/p.jpg", None).is_err());
    }

    #[test]
    fn test_photo_needs_http_url() {
        assert!(validate_photo(1, "file:///etc/passwd", None).is_err());
        assert!(validate_photo(1, "", None).is_err());
    }

    #[test]
    fn test_blank_caption_dropped() {
        let (_, payload) = validate_photo(1, "https://cdn.example/p.jpg", Some("   ")).unwrap();
        assert_eq!(payload, ActivityPayload::Photo { url: "https://cdn.example/p.jpg".into(), caption: None });
    }

    #[test]
    fn test_voice_duration_bounds() {
        assert!(validate_voice("voice-intro", "https://cdn.example/v.m4a", 30).is_ok());
        assert!(validate_voice("voice-intro", "https://cdn.example/v.m4a", 0).is_err());
        assert!(validate_voice("voice-intro", "https://cdn.example/v.m4a", VOICE_MAX_SECS + 1).is_err());
    }

    #[test]
    fn test_unknown_voice_prompt() {
        assert!(matches!(
            validate_voice("voice-song", "https://cdn.example/v.m4a", 10),
            Err(CoreError::NotFound(_))
        ));
    }
}
