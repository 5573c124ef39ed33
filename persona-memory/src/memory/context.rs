//! Context assembler: profile, ranked memories, and recent summaries folded
//! into one bounded text block for the system prompt.

use serde_json::Value;

use crate::memory::MemoryManager;
use crate::types::UserProfile;

pub const PROFILE_HEADING: &str = "[사용자 프로필]";
pub const MEMORY_HEADING: &str = "[기억하고 있는 정보]";
pub const DIRECTIVE_HEADING: &str = "★★★ 최우선 행동 지시 (반드시 따를 것) ★★★";
pub const BACKGROUND_HEADING: &str = "[참고 기억]";
pub const SUMMARY_HEADING: &str = "[이전 대화 요약]";
pub const TRUNCATION_MARKER: &str = "\n... (일부 생략)";

/// Importance at which a memory becomes a binding directive for the
/// generation step rather than background context.
pub const DIRECTIVE_IMPORTANCE: u8 = 5;

impl MemoryManager {
    /// Assemble the memory context for one upcoming reply. Empty string when
    /// nothing is known; the caller omits the block in that case. Output
    /// never exceeds the configured character budget plus the truncation
    /// marker.
    pub async fn build_context(&self, user_id: &str, character: &str) -> String {
        let mut parts = Vec::new();

        if let Some(profile) = self.get_user_profile(user_id).await {
            if let Some(section) = render_profile(&profile) {
                parts.push(section);
            }
        }

        let memories = self
            .rank_memories(user_id, character, self.config().memory_limit)
            .await;
        if !memories.is_empty() {
            let mut lines = Vec::new();
            let (critical, normal): (Vec<_>, Vec<_>) = memories
                .iter()
                .partition(|m| m.importance >= DIRECTIVE_IMPORTANCE);
            if !critical.is_empty() {
                lines.push(DIRECTIVE_HEADING.to_string());
                for memory in critical {
                    lines.push(format!("  → {}", memory.content));
                }
                lines.push(String::new());
            }
            if !normal.is_empty() {
                lines.push(BACKGROUND_HEADING.to_string());
                for memory in normal {
                    lines.push(format!("- [{}] {}", memory.category, memory.content));
                }
            }
            parts.push(format!("{}\n{}", MEMORY_HEADING, lines.join("\n")));
        }

        let summaries = self
            .recent_summaries(user_id, character, self.config().summary_limit)
            .await;
        let summary_lines: Vec<String> = summaries
            .iter()
            .filter(|record| !record.summary.is_empty())
            .map(|record| {
                format!(
                    "- ({}) {}",
                    record.session_start.format("%Y-%m-%d"),
                    record.summary
                )
            })
            .collect();
        if !summary_lines.is_empty() {
            parts.push(format!("{}\n{}", SUMMARY_HEADING, summary_lines.join("\n")));
        }

        if parts.is_empty() {
            return String::new();
        }

        truncate_chars(parts.join("\n\n"), self.config().context_char_budget)
    }
}

fn render_profile(profile: &UserProfile) -> Option<String> {
    let mut lines = Vec::new();

    if !profile.nickname.is_empty() {
        lines.push(format!("이름/닉네임: {}", profile.nickname));
    }
    if let Some(gender) = profile.gender {
        lines.push(format!("성별: {}", gender.label()));
    }
    if !profile.birthday.is_empty() {
        lines.push(format!("생년월일: {}", profile.birthday));
    }
    if !profile.interests.is_empty() {
        lines.push(format!("관심사: {}", profile.interests.join(", ")));
    }
    for (key, value) in &profile.kpop_preferences {
        if let Some(rendered) = render_preference(value) {
            lines.push(format!("케이팝 {}: {}", key, rendered));
        }
    }
    if !profile.preferred_topics.is_empty() {
        lines.push(format!("선호 주제: {}", profile.preferred_topics.join(", ")));
    }

    if lines.is_empty() {
        return None;
    }
    Some(format!("{}\n{}", PROFILE_HEADING, lines.join("\n")))
}

fn render_preference(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

/// Char-boundary-safe hard truncation with marker. The tail is dropped
/// blindly; section ordering decides what survives.
fn truncate_chars(text: String, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text;
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
