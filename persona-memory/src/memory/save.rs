//! Conversation save pipeline.
//!
//! `persist_conversation` is a saga of independent best-effort steps in a
//! fixed order: extraction, transcript blob, conversation record, memory
//! facts, profile merge. A failed step is logged and recorded in the
//! returned [`SaveOutcome`] but never aborts the remaining steps; the
//! production caller ignores the outcome, tests inspect it.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::memory::extraction::ConversationExtraction;
use crate::memory::MemoryManager;
use crate::store::StoreError;
use crate::types::{
    conversation_id, transcript_key, ChatTurn, ConversationRecord, MemoryFact, TranscriptBlob,
};

/// Sessions with fewer turns than this are not worth extracting.
pub const MIN_TURNS_FOR_SAVE: usize = 2;

const MEMORY_ID_SUFFIX_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Skipped,
    Ok,
    Failed,
}

/// Step-level result of one `persist_conversation` run.
#[derive(Debug, Default)]
pub struct SaveOutcome {
    pub skipped: bool,
    pub extraction_ok: bool,
    pub transcript: StepStatus,
    pub record: StepStatus,
    pub facts_written: usize,
    pub facts_failed: usize,
    pub profile: StepStatus,
}

impl MemoryManager {
    /// Full end-of-session save pipeline. No-op below [`MIN_TURNS_FOR_SAVE`]
    /// turns. Never returns an error; each sub-step degrades independently.
    pub async fn persist_conversation(
        &self,
        user_id: &str,
        character: &str,
        turns: &[ChatTurn],
        session_start: DateTime<Utc>,
    ) -> SaveOutcome {
        if turns.len() < MIN_TURNS_FOR_SAVE {
            tracing::debug!(user_id, character, "too few turns to save, skipping");
            return SaveOutcome {
                skipped: true,
                ..SaveOutcome::default()
            };
        }

        let mut outcome = SaveOutcome::default();
        let now = Utc::now();
        let conversation_id = conversation_id(character, session_start);
        let log_path = transcript_key(user_id, &conversation_id);

        // 1) One extraction call; failure collapses to a zeroed extraction.
        let extraction = match self.extract_conversation(character, turns).await {
            Ok(extraction) => {
                outcome.extraction_ok = true;
                extraction
            }
            Err(e) => {
                tracing::error!(user_id, character, error = %e, "conversation extraction failed");
                ConversationExtraction::default()
            }
        };

        // 2) Raw transcript blob
        let blob = TranscriptBlob {
            user_id: user_id.to_string(),
            character: character.to_string(),
            session_start,
            session_end: Some(now),
            message_count: turns.len(),
            messages: turns.to_vec(),
        };
        outcome.transcript = match self.write_transcript(&log_path, &blob).await {
            Ok(()) => StepStatus::Ok,
            Err(e) => {
                tracing::error!(user_id, error = %e, "transcript blob write failed");
                StepStatus::Failed
            }
        };

        // 3) Conversation record
        let record = ConversationRecord {
            user_id: user_id.to_string(),
            conversation_id: conversation_id.clone(),
            character: character.to_string(),
            session_start,
            session_end: now,
            message_count: turns.len(),
            summary: extraction.summary.clone(),
            keywords: extraction.keywords.clone(),
            user_sentiment: extraction.sentiment,
            topics_discussed: extraction.keywords.clone(),
            s3_log_path: log_path,
            new_user_info: extraction.new_user_info.clone(),
        };
        outcome.record = match self.write_record(&record).await {
            Ok(()) => StepStatus::Ok,
            Err(e) => {
                tracing::error!(user_id, error = %e, "conversation record write failed");
                StepStatus::Failed
            }
        };

        // 4) One fact per extracted memory, each under a fresh id
        for memory in &extraction.memories {
            let fact = MemoryFact {
                user_id: user_id.to_string(),
                memory_id: new_memory_id(&memory.scope),
                character: memory.scope.clone(),
                category: memory.category,
                content: memory.content.clone(),
                importance: clamp_importance(memory.importance),
                source_conversation: conversation_id.clone(),
                created_at: now,
                last_referenced: now,
                reference_count: 0,
                active: true,
            };
            match self.write_fact(&fact).await {
                Ok(()) => outcome.facts_written += 1,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "memory fact write failed");
                    outcome.facts_failed += 1;
                }
            }
        }

        // 5) Propagate recognized profile fields from the extraction
        let updates = profile_updates_from_new_info(&extraction.new_user_info);
        outcome.profile = if updates.is_empty() {
            StepStatus::Skipped
        } else {
            match self.apply_profile_updates(user_id, updates).await {
                Ok(()) => StepStatus::Ok,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "profile merge failed");
                    StepStatus::Failed
                }
            }
        };

        tracing::info!(
            user_id,
            character,
            turns = turns.len(),
            facts = outcome.facts_written,
            "conversation saved"
        );
        outcome
    }

    /// Lightweight per-turn save: overwrite the transcript blob with the
    /// current turn list, no extraction. Idempotent.
    pub async fn persist_incremental(
        &self,
        user_id: &str,
        character: &str,
        turns: &[ChatTurn],
        session_start: DateTime<Utc>,
    ) {
        if turns.is_empty() {
            return;
        }

        let conversation_id = conversation_id(character, session_start);
        let log_path = transcript_key(user_id, &conversation_id);
        let blob = TranscriptBlob {
            user_id: user_id.to_string(),
            character: character.to_string(),
            session_start,
            session_end: None,
            message_count: turns.len(),
            messages: turns.to_vec(),
        };

        if let Err(e) = self.write_transcript(&log_path, &blob).await {
            tracing::error!(user_id, character, error = %e, "incremental transcript write failed");
        }
    }

    async fn write_transcript(&self, path: &str, blob: &TranscriptBlob) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(blob)?;
        self.blobs().put(path, bytes, "application/json").await
    }

    async fn write_record(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let item = serde_json::to_value(record)?;
        self.documents()
            .put(&self.config().tables.conversations, item)
            .await
    }

    pub(crate) async fn write_fact(&self, fact: &MemoryFact) -> Result<(), StoreError> {
        let item = serde_json::to_value(fact)?;
        self.documents()
            .put(&self.config().tables.memories, item)
            .await
    }
}

fn new_memory_id(scope: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}#{}", scope, &suffix[..MEMORY_ID_SUFFIX_LEN])
}

/// The model rates importance 1-5; out-of-range values would silently break
/// the directive partition in the context assembler, so they are clamped at
/// the write boundary.
fn clamp_importance(importance: i64) -> u8 {
    if !(1..=5).contains(&importance) {
        tracing::warn!(importance, "clamping out-of-range importance");
    }
    importance.clamp(1, 5) as u8
}

/// Recognized profile fields from the extraction's `new_user_info`: a
/// favorite-group mention replaces the kpop preference map wholesale
/// (matching the save pipeline's historical behavior), birthday and nickname
/// merge individually.
fn profile_updates_from_new_info(new_info: &Map<String, Value>) -> Map<String, Value> {
    let mut updates = Map::new();
    if new_info.is_empty() {
        return updates;
    }
    if new_info.get("favorite_group").is_some_and(non_empty) {
        updates.insert(
            "kpop_preferences".to_string(),
            Value::Object(new_info.clone()),
        );
    }
    for field in ["birthday", "nickname"] {
        if let Some(value) = new_info.get(field) {
            if non_empty(value) {
                updates.insert(field.to_string(), value.clone());
            }
        }
    }
    updates
}

fn non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn importance_clamps_into_range() {
        assert_eq!(clamp_importance(0), 1);
        assert_eq!(clamp_importance(3), 3);
        assert_eq!(clamp_importance(5), 5);
        assert_eq!(clamp_importance(9), 5);
        assert_eq!(clamp_importance(-2), 1);
    }

    #[test]
    fn memory_ids_are_scoped_and_unique() {
        let a = new_memory_id("global");
        let b = new_memory_id("global");
        assert!(a.starts_with("global#"));
        assert_eq!(a.len(), "global#".len() + MEMORY_ID_SUFFIX_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn unrecognized_new_info_fields_are_ignored() {
        let new_info = json!({"shoe_size": "270"});
        let updates = profile_updates_from_new_info(new_info.as_object().unwrap());
        assert!(updates.is_empty());
    }

    #[test]
    fn favorite_group_replaces_preference_map() {
        let new_info = json!({"favorite_group": "ATEEZ", "nickname": "미나"});
        let updates = profile_updates_from_new_info(new_info.as_object().unwrap());
        assert_eq!(updates["kpop_preferences"], new_info);
        assert_eq!(updates["nickname"], json!("미나"));
        assert!(!updates.contains_key("birthday"));
    }
}
