use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{ActivityCategory, ActivityPayload, ActivityRecord, AnswerPayload, GamePayload};
use crate::nucleus::games::{self, GameDefinition};
use crate::nucleus::media::{self, VOICE_PROMPTS, VoicePrompt};
use crate::nucleus::questions::{self, Question};
use crate::services::ledger::{ActivityLedger, SubmissionOutcome};

/// One activity key as seen by one participant. The partner's payload stays
/// hidden until both have submitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub key: String,
    pub mine: Option<ActivityPayload>,
    pub theirs: Option<ActivityPayload>,
    pub partner_submitted: bool,
    pub both_completed: bool,
}

impl ActivityEntry {
    fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            mine: None,
            theirs: None,
            partner_submitted: false,
            both_completed: false,
        }
    }
}

/// Group records by key from the viewer's side, in first-submission order.
pub fn pair_records(records: &[ActivityRecord], viewer: Uuid) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = Vec::new();

    for record in records {
        let index = match entries.iter().position(|e| e.key == record.activity_key) {
            Some(i) => i,
            None => {
                entries.push(ActivityEntry::empty(&record.activity_key));
                entries.len() - 1
            }
        };
        let entry = &mut entries[index];
        entry.both_completed |= record.both_completed;

        if record.user_id == viewer {
            entry.mine = Some(record.payload.0.clone());
        } else {
            entry.partner_submitted = true;
            entry.theirs = Some(record.payload.0.clone());
        }
    }

    for entry in &mut entries {
        if !entry.both_completed {
            entry.theirs = None;
        }
    }
    entries
}

fn entry_for(entries: &[ActivityEntry], key: &str) -> ActivityEntry {
    entries
        .iter()
        .find(|e| e.key == key)
        .cloned()
        .unwrap_or_else(|| ActivityEntry::empty(key))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub question: &'static Question,
    #[serde(flatten)]
    pub entry: ActivityEntry,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceEntry {
    pub prompt: &'static VoicePrompt,
    #[serde(flatten)]
    pub entry: ActivityEntry,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
    pub game: &'static GameDefinition,
    #[serde(flatten)]
    pub entry: ActivityEntry,
}

/// Questions, photos, voice notes and games of one nucleus
#[derive(Clone)]
pub struct NucleusActivities {
    ledger: ActivityLedger,
}

impl NucleusActivities {
    pub fn new(ledger: ActivityLedger) -> Self {
        Self { ledger }
    }

    async fn entries(&self, connection_id: Uuid, viewer: Uuid, category: ActivityCategory) -> Result<Vec<ActivityEntry>> {
        let (_, records) = self.ledger.records(connection_id, viewer, category).await?;
        Ok(pair_records(&records, viewer))
    }

    pub async fn questions(&self, connection_id: Uuid, viewer: Uuid, category: &str) -> Result<Vec<QuestionEntry>> {
        let catalog = questions::in_category(category);
        if catalog.is_empty() {
            return Err(CoreError::NotFound("question category"));
        }

        let entries = self.entries(connection_id, viewer, ActivityCategory::Question).await?;
        Ok(catalog
            .into_iter()
            .map(|question| QuestionEntry {
                question,
                entry: entry_for(&entries, question.id),
            })
            .collect())
    }

    pub async fn answer_question(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        category: &str,
        question_id: &str,
        answer: &AnswerPayload,
    ) -> Result<SubmissionOutcome> {
        let question = questions::find(question_id).ok_or(CoreError::NotFound("question"))?;
        if question.category != category {
            return Err(CoreError::validation(format!(
                "Question {} does not belong to {}",
                question_id, category
            )));
        }
        let answer = questions::validate_answer(question, answer)?;

        self.ledger
            .record_submission(connection_id, user_id, question.id, &ActivityPayload::Answer(answer))
            .await
    }

    pub async fn photos(&self, connection_id: Uuid, viewer: Uuid) -> Result<Vec<ActivityEntry>> {
        let entries = self.entries(connection_id, viewer, ActivityCategory::Photo).await?;
        Ok((1..=crate::constants::PHOTO_SLOTS)
            .map(|slot| entry_for(&entries, &media::photo_key(slot)))
            .collect())
    }

    pub async fn submit_photo(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        slot: i32,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SubmissionOutcome> {
        let (key, payload) = media::validate_photo(slot, url, caption)?;
        self.ledger.record_submission(connection_id, user_id, &key, &payload).await
    }

    pub async fn voices(&self, connection_id: Uuid, viewer: Uuid) -> Result<Vec<VoiceEntry>> {
        let entries = self.entries(connection_id, viewer, ActivityCategory::Voice).await?;
        Ok(VOICE_PROMPTS
            .iter()
            .map(|prompt| VoiceEntry {
                prompt,
                entry: entry_for(&entries, prompt.id),
            })
            .collect())
    }

    pub async fn submit_voice(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        prompt_id: &str,
        url: &str,
        duration_secs: i32,
    ) -> Result<SubmissionOutcome> {
        let (key, payload) = media::validate_voice(prompt_id, url, duration_secs)?;
        self.ledger.record_submission(connection_id, user_id, &key, &payload).await
    }

    pub async fn games(&self, connection_id: Uuid, viewer: Uuid) -> Result<Vec<GameEntry>> {
        let entries = self.entries(connection_id, viewer, ActivityCategory::Game).await?;
        Ok(games::GAMES
            .iter()
            .map(|game| GameEntry {
                game,
                entry: entry_for(&entries, game.id),
            })
            .collect())
    }

    pub async fn play_game(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        game_id: &str,
        entry: &GamePayload,
    ) -> Result<SubmissionOutcome> {
        let game = games::find(game_id).ok_or(CoreError::NotFound("game"))?;
        let entry = games::validate_entry(game, entry)?;
        self.ledger
            .record_submission(connection_id, user_id, game.id, &ActivityPayload::Game(entry))
            .await
    }
}
