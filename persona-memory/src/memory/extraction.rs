//! Memory extraction engine: one generation call turns a finished
//! conversation into a summary, sentiment, keywords, and durable memories.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ai::{AiError, GenerationRequest};
use crate::memory::prompt::{extraction_prompt, render_turns, strip_code_fence};
use crate::memory::MemoryManager;
use crate::types::{ChatTurn, MemoryCategory, Sentiment, GLOBAL_SCOPE};

pub const USER_LABEL: &str = "사용자";

const EXTRACTION_MAX_TOKENS: u32 = 1500;
const EXTRACTION_TEMPERATURE: f32 = 0.3;
const MAX_KEYWORDS: usize = 5;

/// One durable memory as the model proposed it. `importance` is the raw
/// model value; the save pipeline clamps it into [1, 5] before writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMemory {
    pub scope: String,
    pub category: MemoryCategory,
    pub content: String,
    pub importance: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationExtraction {
    pub summary: String,
    pub keywords: Vec<String>,
    pub sentiment: Sentiment,
    pub new_user_info: Map<String, Value>,
    pub memories: Vec<ExtractedMemory>,
}

#[derive(Debug, Deserialize, Default)]
struct RawExtraction {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    user_sentiment: String,
    #[serde(default)]
    new_user_info: Map<String, Value>,
    #[serde(default)]
    memories: Vec<RawMemory>,
}

#[derive(Debug, Deserialize)]
struct RawMemory {
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    importance: Option<i64>,
}

/// Decode model output into a validated extraction. String tags go through
/// the closed enums; an unknown sentiment falls back to neutral and an
/// unknown memory category drops that memory.
pub fn decode_extraction(text: &str) -> Result<ConversationExtraction, AiError> {
    let raw: RawExtraction = serde_json::from_str(strip_code_fence(text))?;

    let sentiment = if raw.user_sentiment.is_empty() {
        Sentiment::Neutral
    } else {
        raw.user_sentiment.parse().unwrap_or_else(|_| {
            tracing::warn!(tag = %raw.user_sentiment, "unknown sentiment tag, using neutral");
            Sentiment::Neutral
        })
    };

    let mut memories = Vec::new();
    for memory in raw.memories {
        if memory.content.is_empty() {
            continue;
        }
        let category = match memory.category.as_deref() {
            None => MemoryCategory::default(),
            Some(tag) => match tag.parse() {
                Ok(category) => category,
                Err(_) => {
                    tracing::warn!(tag, content = %memory.content, "unknown memory category, dropping memory");
                    continue;
                }
            },
        };
        memories.push(ExtractedMemory {
            scope: memory
                .character
                .filter(|scope| !scope.is_empty())
                .unwrap_or_else(|| GLOBAL_SCOPE.to_string()),
            category,
            content: memory.content,
            importance: memory.importance.unwrap_or(3),
        });
    }

    let mut keywords = raw.keywords;
    keywords.truncate(MAX_KEYWORDS);

    Ok(ConversationExtraction {
        summary: raw.summary,
        keywords,
        sentiment,
        new_user_info: raw.new_user_info,
        memories,
    })
}

impl MemoryManager {
    /// Single-call extraction over the cheap tier. The caller guarantees at
    /// least 2 turns; shorter inputs produce a low-quality extraction rather
    /// than an error. Transport and parse failures both surface as `Err` so
    /// the save pipeline can collapse them to a zeroed extraction.
    pub(crate) async fn extract_conversation(
        &self,
        character: &str,
        turns: &[ChatTurn],
    ) -> Result<ConversationExtraction, AiError> {
        let conversation = render_turns(turns, USER_LABEL, character);
        let prompt = extraction_prompt(character, &conversation);
        let text = self
            .generator()
            .generate(GenerationRequest::fast(
                prompt,
                EXTRACTION_MAX_TOKENS,
                EXTRACTION_TEMPERATURE,
            ))
            .await?;
        decode_extraction(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_extraction() {
        let text = json!({
            "summary": "콘서트 이야기를 나눴다.",
            "keywords": ["콘서트", "ATEEZ"],
            "user_sentiment": "positive",
            "new_user_info": {"favorite_group": "ATEEZ"},
            "memories": [
                {"character": "global", "category": "event", "content": "다음 주 콘서트에 간다", "importance": 4},
            ],
        })
        .to_string();

        let extraction = decode_extraction(&text).unwrap();
        assert_eq!(extraction.sentiment, Sentiment::Positive);
        assert_eq!(extraction.memories.len(), 1);
        assert_eq!(extraction.memories[0].category, MemoryCategory::Event);
        assert_eq!(extraction.memories[0].scope, "global");
    }

    #[test]
    fn drops_memories_with_unknown_category() {
        let text = json!({
            "memories": [
                {"character": "global", "category": "vibes", "content": "???", "importance": 2},
                {"character": "global", "category": "fact", "content": "커피를 좋아한다", "importance": 2},
            ],
        })
        .to_string();

        let extraction = decode_extraction(&text).unwrap();
        assert_eq!(extraction.memories.len(), 1);
        assert_eq!(extraction.memories[0].content, "커피를 좋아한다");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let text = json!({
            "memories": [{"content": "닉네임은 미나다"}],
        })
        .to_string();

        let extraction = decode_extraction(&text).unwrap();
        assert_eq!(extraction.sentiment, Sentiment::Neutral);
        assert!(extraction.summary.is_empty());
        assert_eq!(extraction.memories[0].scope, GLOBAL_SCOPE);
        assert_eq!(extraction.memories[0].category, MemoryCategory::Fact);
        assert_eq!(extraction.memories[0].importance, 3);
    }

    #[test]
    fn unknown_sentiment_degrades_to_neutral() {
        let text = json!({"user_sentiment": "ecstatic"}).to_string();
        let extraction = decode_extraction(&text).unwrap();
        assert_eq!(extraction.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn non_json_output_is_an_error() {
        assert!(decode_extraction("I could not produce JSON today.").is_err());
    }

    #[test]
    fn fenced_output_decodes() {
        let text = "```json\n{\"summary\": \"짧은 요약\"}\n```";
        let extraction = decode_extraction(text).unwrap();
        assert_eq!(extraction.summary, "짧은 요약");
    }

    #[test]
    fn keywords_cap_at_five() {
        let text = json!({
            "keywords": ["a", "b", "c", "d", "e", "f", "g"],
        })
        .to_string();
        let extraction = decode_extraction(&text).unwrap();
        assert_eq!(extraction.keywords.len(), 5);
    }
}
