//! Record types shared across the memory subsystem.
//!
//! Everything here round-trips through `serde_json::Value` on its way to and
//! from the document store, so every field carries serde defaults that match
//! what older records may be missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Scope sentinel for memories visible to every character persona.
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single chat turn as the conversation loop hands it to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_emotion: Option<String>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
            selected_emotion: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
            selected_emotion: None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Localized label used when rendering the profile context section.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "남성",
            Self::Female => "여성",
        }
    }
}

/// One profile per end user, created on first login and mutated by the
/// onboarding and profile-completion flows plus new-fact propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub kpop_preferences: Map<String, Value>,
    #[serde(default)]
    pub preferred_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub onboarding_step: u8,
    #[serde(default)]
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    #[serde(default)]
    pub total_sessions: u64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// One record per completed chat session. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub user_id: String,
    /// Composite id: `{character}#{rfc3339 session start}`.
    pub conversation_id: String,
    pub character: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub user_sentiment: Sentiment,
    #[serde(default)]
    pub topics_discussed: Vec<String>,
    pub s3_log_path: String,
    #[serde(default)]
    pub new_user_info: Map<String, Value>,
}

pub fn conversation_id(character: &str, session_start: DateTime<Utc>) -> String {
    format!("{}#{}", character, session_start.to_rfc3339())
}

pub fn transcript_key(user_id: &str, conversation_id: &str) -> String {
    format!("chat-logs/{user_id}/{conversation_id}.json")
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemoryCategory {
    #[default]
    Fact,
    Preference,
    Emphasis,
    Relationship,
    Event,
}

/// One durable fact extracted from a conversation. Append-only; only the
/// reference metadata (`reference_count`, `last_referenced`) changes after
/// the initial write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFact {
    pub user_id: String,
    /// Composite id: `{scope}#{random 12-hex suffix}`.
    pub memory_id: String,
    /// Either [`GLOBAL_SCOPE`] or a character identifier. Kept as a raw
    /// string: the extraction output is trusted not to name a character,
    /// only to pick a visibility domain.
    pub character: String,
    pub category: MemoryCategory,
    pub content: String,
    /// 1-5; 5 is a mandatory behavioral directive, not background context.
    pub importance: u8,
    pub source_conversation: String,
    pub created_at: DateTime<Utc>,
    pub last_referenced: DateTime<Utc>,
    #[serde(default)]
    pub reference_count: u64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Raw transcript payload written to the blob store after every turn and
/// rewritten wholesale at session end. Never read back by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptBlob {
    pub user_id: String,
    pub character: String,
    pub session_start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_end: Option<DateTime<Utc>>,
    pub message_count: usize,
    pub messages: Vec<ChatTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_strings() {
        let parsed: MemoryCategory = "emphasis".parse().unwrap();
        assert_eq!(parsed, MemoryCategory::Emphasis);
        assert_eq!(MemoryCategory::Preference.to_string(), "preference");
        assert!("vibe".parse::<MemoryCategory>().is_err());
    }

    #[test]
    fn sentiment_defaults_to_neutral() {
        assert_eq!(Sentiment::default(), Sentiment::Neutral);
    }

    #[test]
    fn fact_active_defaults_to_true_when_absent() {
        let value = serde_json::json!({
            "user_id": "u1",
            "memory_id": "global#abc",
            "character": "global",
            "category": "fact",
            "content": "likes coffee",
            "importance": 3,
            "source_conversation": "rumi#2026-01-01T00:00:00+00:00",
            "created_at": "2026-01-01T00:00:00Z",
            "last_referenced": "2026-01-01T00:00:00Z",
        });
        let fact: MemoryFact = serde_json::from_value(value).unwrap();
        assert!(fact.active);
        assert_eq!(fact.reference_count, 0);
    }
}
