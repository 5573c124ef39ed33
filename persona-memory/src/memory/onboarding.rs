//! Onboarding: a fixed 5-step profile-collection dialogue embedded in
//! ordinary chat turns. The sequential [`SlotFiller`] walks the slots behind
//! the profile's step cursor; every turn a cheap judgment call decides
//! whether the current step's information has been collected.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ai::GenerationRequest;
use crate::memory::prompt::{onboarding_extraction_prompt, recent_window, render_turns, strip_code_fence};
use crate::memory::slots::{ProfileSlot, SlotDiscipline, SlotFiller, SlotSpec};
use crate::memory::MemoryManager;
use crate::types::ChatTurn;

/// Assistant label used when rendering turns for judgment calls; the judge
/// does not need to know which persona spoke.
pub(crate) const JUDGE_ASSISTANT_LABEL: &str = "캐릭터";

const JUDGMENT_MAX_TOKENS: u32 = 500;
const JUDGMENT_TEMPERATURE: f32 = 0.2;

pub const ONBOARDING_SLOTS: [SlotSpec; 5] = [
    SlotSpec {
        slot: ProfileSlot::Nickname,
        instruction: "사용자에게 자기소개를 하면서 사용자의 이름이나 닉네임을 자연스럽게 물어보세요.",
    },
    SlotSpec {
        slot: ProfileSlot::Birthday,
        instruction: "대화 흐름에 맞춰 사용자의 생년월일을 자연스럽게 물어보세요.",
    },
    SlotSpec {
        slot: ProfileSlot::Interests,
        instruction: "사용자가 좋아하는 것이나 취미를 자연스럽게 물어보세요.",
    },
    SlotSpec {
        slot: ProfileSlot::KpopPreferences,
        instruction: "좋아하는 케이팝 그룹, 멤버, 장르 등 케이팝 취향을 물어보세요.",
    },
    SlotSpec {
        slot: ProfileSlot::PreferredTopics,
        instruction: "앞으로 어떤 이야기를 하고 싶은지 자연스럽게 물어보세요. 이것이 마지막 질문입니다.",
    },
];

pub const ONBOARDING_FILLER: SlotFiller =
    SlotFiller::new(SlotDiscipline::Sequential, &ONBOARDING_SLOTS);

/// Last step index that dispatches; step `LAST_STEP + 1` means complete.
pub const LAST_STEP: u8 = 4;

#[derive(Debug, Deserialize, Default)]
struct OnboardingJudgment {
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    birthday: Option<String>,
    #[serde(default)]
    interests: Option<Vec<String>>,
    #[serde(default)]
    kpop_preferences: Option<Map<String, Value>>,
    #[serde(default)]
    preferred_topics: Option<Vec<String>>,
    #[serde(default)]
    step_complete: bool,
}

impl OnboardingJudgment {
    fn value_for(&self, slot: ProfileSlot) -> Option<Value> {
        match slot {
            ProfileSlot::Nickname => self
                .nickname
                .as_ref()
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.clone())),
            ProfileSlot::Birthday => self
                .birthday
                .as_ref()
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.clone())),
            ProfileSlot::Interests => self
                .interests
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| serde_json::to_value(v).unwrap_or(Value::Null)),
            ProfileSlot::KpopPreferences => self
                .kpop_preferences
                .as_ref()
                .filter(|m| !m.is_empty())
                .map(|m| Value::Object(m.clone())),
            ProfileSlot::PreferredTopics => self
                .preferred_topics
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| serde_json::to_value(v).unwrap_or(Value::Null)),
            ProfileSlot::Gender => None,
        }
    }
}

impl MemoryManager {
    /// Instruction snippet appended to the system prompt while onboarding is
    /// incomplete; empty when there is nothing to collect.
    pub async fn onboarding_prompt_addition(&self, user_id: &str, _character: &str) -> String {
        let Some(profile) = self.get_user_profile(user_id).await else {
            return String::new();
        };
        if profile.onboarding_complete {
            return String::new();
        }

        let step = profile.onboarding_step as usize;
        let Some(spec) = ONBOARDING_FILLER.pending(&profile, step).into_iter().next() else {
            return String::new();
        };

        format!(
            "\n\n[온보딩 지시]\n\
             이 사용자는 아직 프로필 수집이 완료되지 않았습니다. (현재 단계: {}/{})\n\
             대화 중 자연스럽게 다음 정보를 수집해주세요: {}\n\
             너무 직접적으로 묻지 말고, 대화 흐름에 녹여서 물어보세요.",
            step, LAST_STEP, spec.instruction
        )
    }

    /// Judge the last few turns against the current step. Returns the new
    /// step: unchanged when the step is out of range, the judgment call
    /// fails, or the step is not yet answered; incremented by exactly one on
    /// success. Crossing the last step permanently sets the complete flag.
    pub async fn process_onboarding_turn(
        &self,
        user_id: &str,
        turns: &[ChatTurn],
        current_step: u8,
    ) -> u8 {
        let Some(spec) = ONBOARDING_SLOTS.get(current_step as usize) else {
            return current_step;
        };

        let window = recent_window(turns, self.config().judge_window);
        let conversation =
            render_turns(window, super::extraction::USER_LABEL, JUDGE_ASSISTANT_LABEL);
        let prompt = onboarding_extraction_prompt(spec.slot.field_name(), &conversation);

        let text = match self
            .generator()
            .generate(GenerationRequest::fast(
                prompt,
                JUDGMENT_MAX_TOKENS,
                JUDGMENT_TEMPERATURE,
            ))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(user_id, current_step, error = %e, "onboarding judgment failed");
                return current_step;
            }
        };

        let judgment: OnboardingJudgment = match serde_json::from_str(strip_code_fence(&text)) {
            Ok(judgment) => judgment,
            Err(e) => {
                tracing::error!(user_id, current_step, error = %e, "onboarding judgment unparseable");
                return current_step;
            }
        };

        if !judgment.step_complete {
            return current_step;
        }

        let mut updates = Map::new();
        if let Some(value) = judgment.value_for(spec.slot) {
            updates.insert(spec.slot.field_name().to_string(), value);
        }

        let new_step = current_step + 1;
        updates.insert("onboarding_step".to_string(), Value::from(new_step));
        if new_step > LAST_STEP {
            updates.insert("onboarding_complete".to_string(), Value::Bool(true));
        }

        if let Err(e) = self.apply_profile_updates(user_id, updates).await {
            tracing::error!(user_id, current_step, error = %e, "onboarding profile update failed");
            return current_step;
        }

        tracing::info!(user_id, from = current_step, to = new_step, "onboarding step complete");
        new_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_cover_steps_zero_through_four_in_order() {
        let order: Vec<ProfileSlot> = ONBOARDING_SLOTS.iter().map(|s| s.slot).collect();
        assert_eq!(
            order,
            vec![
                ProfileSlot::Nickname,
                ProfileSlot::Birthday,
                ProfileSlot::Interests,
                ProfileSlot::KpopPreferences,
                ProfileSlot::PreferredTopics,
            ]
        );
        assert_eq!(ONBOARDING_SLOTS.len(), LAST_STEP as usize + 1);
    }

    #[test]
    fn judgment_ignores_empty_values() {
        let judgment = OnboardingJudgment {
            nickname: Some(String::new()),
            ..OnboardingJudgment::default()
        };
        assert!(judgment.value_for(ProfileSlot::Nickname).is_none());

        let judgment = OnboardingJudgment {
            interests: Some(vec!["댄스".to_string()]),
            ..OnboardingJudgment::default()
        };
        assert_eq!(
            judgment.value_for(ProfileSlot::Interests),
            Some(serde_json::json!(["댄스"]))
        );
    }
}
