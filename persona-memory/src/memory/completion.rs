//! Profile completion: opportunistic collection of optional profile fields
//! that onboarding never asks for. Runs every turn regardless of onboarding
//! state; a field only fills when the extraction is high-confidence, and a
//! discarded extraction carries no retry bookkeeping.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ai::GenerationRequest;
use crate::memory::onboarding::JUDGE_ASSISTANT_LABEL;
use crate::memory::prompt::{
    profile_completion_extraction_prompt, recent_window, render_turns, strip_code_fence,
};
use crate::memory::slots::{Confidence, ProfileSlot, SlotDiscipline, SlotFiller, SlotSpec};
use crate::memory::MemoryManager;
use crate::types::{ChatTurn, Gender};

const COMPLETION_MAX_TOKENS: u32 = 200;
const COMPLETION_TEMPERATURE: f32 = 0.1;

pub const COMPLETION_SLOTS: [SlotSpec; 1] = [SlotSpec {
    slot: ProfileSlot::Gender,
    instruction: "대화 흐름에 맞춰 사용자의 성별을 자연스럽게 파악하세요. 직접 묻기보다는 '오빠라고 불러도 될까요?' 같은 자연스러운 방식으로 확인하세요.",
}];

pub const COMPLETION_FILLER: SlotFiller =
    SlotFiller::new(SlotDiscipline::Opportunistic, &COMPLETION_SLOTS);

#[derive(Debug, Deserialize, Default)]
struct CompletionExtraction {
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    confidence: Option<Confidence>,
}

impl MemoryManager {
    /// Instruction snippet for still-missing optional fields; empty when the
    /// profile is absent or nothing is missing.
    pub async fn profile_completion_prompt(&self, user_id: &str) -> String {
        let Some(profile) = self.get_user_profile(user_id).await else {
            return String::new();
        };

        let pending = COMPLETION_FILLER.pending(&profile, 0);
        if pending.is_empty() {
            return String::new();
        }

        let instructions: Vec<String> = pending
            .iter()
            .map(|spec| format!("- {}", spec.instruction))
            .collect();
        format!(
            "\n\n[프로필 보완 지시]\n\
             아직 파악하지 못한 사용자 정보가 있습니다. 대화 중 자연스럽게 확인해주세요:\n{}",
            instructions.join("\n")
        )
    }

    /// Try to extract still-missing optional fields from the last few turns.
    /// Only high-confidence extractions with a valid value are applied;
    /// everything else is silently discarded.
    pub async fn process_profile_completion_turn(&self, user_id: &str, turns: &[ChatTurn]) {
        let Some(profile) = self.get_user_profile(user_id).await else {
            return;
        };

        let pending = COMPLETION_FILLER.pending(&profile, 0);
        if pending.is_empty() {
            return;
        }

        let window = recent_window(turns, self.config().judge_window);
        let conversation =
            render_turns(window, super::extraction::USER_LABEL, JUDGE_ASSISTANT_LABEL);
        let prompt = profile_completion_extraction_prompt(&conversation);

        let text = match self
            .generator()
            .generate(GenerationRequest::fast(
                prompt,
                COMPLETION_MAX_TOKENS,
                COMPLETION_TEMPERATURE,
            ))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(user_id, error = %e, "profile completion extraction failed");
                return;
            }
        };

        let extraction: CompletionExtraction = match serde_json::from_str(strip_code_fence(&text))
        {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!(user_id, error = %e, "profile completion output unparseable");
                return;
            }
        };

        if extraction.confidence != Some(Confidence::High) {
            return;
        }

        let mut updates = Map::new();
        let gender_pending = pending.iter().any(|spec| spec.slot == ProfileSlot::Gender);
        if gender_pending {
            if let Some(tag) = extraction.gender.as_deref() {
                match tag.parse::<Gender>() {
                    Ok(gender) => {
                        updates.insert(
                            "gender".to_string(),
                            Value::String(gender.to_string()),
                        );
                    }
                    Err(_) => {
                        tracing::warn!(user_id, tag, "invalid gender tag, discarding");
                    }
                }
            }
        }

        if updates.is_empty() {
            return;
        }

        if let Err(e) = self.apply_profile_updates(user_id, updates.clone()).await {
            tracing::error!(user_id, error = %e, "profile completion update failed");
            return;
        }
        tracing::info!(user_id, fields = updates.len(), "profile completion applied");
    }
}
