//! Prompt templates for the extraction, onboarding, and profile-completion
//! calls. All templates demand JSON-only output; [`strip_code_fence`] peels
//! the markdown fence models wrap it in anyway.

use crate::types::{ChatTurn, TurnRole};

/// Render turns as `<role-label>: <content>` lines.
pub fn render_turns(turns: &[ChatTurn], user_label: &str, assistant_label: &str) -> String {
    turns
        .iter()
        .map(|turn| {
            let label = match turn.role {
                TurnRole::User => user_label,
                TurnRole::Assistant => assistant_label,
            };
            format!("{}: {}", label, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last `window` turns of a conversation, used for judgment calls.
pub fn recent_window(turns: &[ChatTurn], window: usize) -> &[ChatTurn] {
    let start = turns.len().saturating_sub(window);
    &turns[start..]
}

/// Strip one surrounding markdown code fence, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Single-call extraction of summary, keywords, sentiment, profile info, and
/// long-term memories from a finished conversation.
pub fn extraction_prompt(character: &str, conversation: &str) -> String {
    format!(
        r#"다음 캐릭터({character})와 사용자 간의 대화를 분석하여 아래 정보를 JSON으로 추출해주세요.
중요: 반드시 유효한 JSON만 출력하세요. 다른 텍스트는 포함하지 마세요.

대화 내용:
{conversation}

추출할 정보:
1. summary: 대화 내용을 2-3문장으로 요약
2. keywords: 대화의 핵심 키워드 (최대 5개)
3. user_sentiment: 사용자의 전반적 감정 ("positive", "neutral", "negative" 중 하나)
4. new_user_info: 대화에서 발견된 사용자 개인 정보 (이름, 생일, 취미, 좋아하는 그룹 등). 없으면 빈 객체
5. memories: 장기적으로 기억해야 할 중요한 정보 리스트. 각 항목:
   - character: "global" (모든 캐릭터 공유) 또는 캐릭터명 (해당 캐릭터만 관련)
   - category: "fact" | "preference" | "emphasis" | "relationship" | "event" 중 하나
   - content: 기억할 내용 (한 문장)
   - importance: 1-5 (5가 가장 중요, 사용자가 명시적으로 강조한 내용은 5)

예시 출력:
{{
  "summary": "사용자가 다음 주 콘서트에 대해 설명하며 기대감을 표현했다.",
  "keywords": ["콘서트", "ATEEZ", "다음주"],
  "user_sentiment": "positive",
  "new_user_info": {{"favorite_group": "ATEEZ"}},
  "memories": [
    {{"character": "global", "category": "event", "content": "사용자는 다음 주 ATEEZ 콘서트에 갈 예정이다", "importance": 4}},
    {{"character": "{character}", "category": "preference", "content": "사용자는 ATEEZ의 홍중을 최애로 꼽았다", "importance": 3}}
  ]
}}

JSON 출력:"#
    )
}

/// Judgment call for the current onboarding step.
pub fn onboarding_extraction_prompt(field: &str, conversation: &str) -> String {
    format!(
        r#"다음 대화에서 사용자가 제공한 개인 정보를 추출해주세요.
반드시 유효한 JSON만 출력하세요. 다른 텍스트는 포함하지 마세요.

현재 수집 중인 정보: {field}
대화의 마지막 사용자 메시지를 중심으로 분석하세요.

대화:
{conversation}

추출 형식:
- nickname: 사용자의 이름이나 닉네임 (문자열 또는 null)
- birthday: 생년월일 "YYYY-MM-DD" 형식 (문자열 또는 null)
- interests: 관심사/취미 리스트 (배열 또는 null)
- kpop_preferences: 케이팝 취향 (객체: favorite_groups, favorite_members, bias 등, 또는 null)
- preferred_topics: 대화하고 싶은 주제 리스트 (배열 또는 null)
- step_complete: 현재 단계의 정보가 충분히 수집되었는지 (true/false)

JSON 출력:"#
    )
}

/// Opportunistic extraction of still-missing optional profile fields.
pub fn profile_completion_extraction_prompt(conversation: &str) -> String {
    format!(
        r#"다음 대화에서 사용자의 성별 정보를 추출해주세요.
반드시 유효한 JSON만 출력하세요. 다른 텍스트는 포함하지 마세요.

대화:
{conversation}

추출 형식:
- gender: "male" 또는 "female" 또는 null (판단 불가 시)
- confidence: "high" 또는 "low"

판단 기준:
- 사용자가 직접 성별을 밝힌 경우 → high
- "오빠/형이라고 불러줘" → male, high
- "언니/누나라고 불러줘" → female, high
- 맥락상 명확히 추론 가능한 경우 → high
- 불확실한 경우 → null, low

JSON 출력:"#
    )
}
