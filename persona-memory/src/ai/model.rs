use serde::{Deserialize, Serialize};

/// The models the chatbot routes between on Bedrock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    ClaudeSonnet45,
    ClaudeSonnet4,
    ClaudeHaiku45,
}

impl Model {
    pub fn name(self) -> &'static str {
        match self {
            Self::ClaudeSonnet45 => "claude-sonnet-4.5",
            Self::ClaudeSonnet4 => "claude-sonnet-4",
            Self::ClaudeHaiku45 => "claude-haiku-4.5",
        }
    }

    pub fn bedrock_model_id(self) -> &'static str {
        match self {
            Self::ClaudeSonnet45 => "us.anthropic.claude-sonnet-4-5-20250929-v1:0",
            Self::ClaudeSonnet4 => "us.anthropic.claude-sonnet-4-20250514-v1:0",
            Self::ClaudeHaiku45 => "us.anthropic.claude-haiku-4-5-20251001-v1:0",
        }
    }
}

/// Cost/quality routing level. Every tier carries a primary model and a
/// single fallback tried once when the primary call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Cheap calls: extraction, onboarding judgment, profile completion.
    Fast,
    /// The user-facing reply path.
    Capable,
}

impl Tier {
    pub fn primary(self) -> Model {
        match self {
            Self::Fast => Model::ClaudeHaiku45,
            Self::Capable => Model::ClaudeSonnet45,
        }
    }

    pub fn fallback(self) -> Model {
        match self {
            Self::Fast | Self::Capable => Model::ClaudeSonnet4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_route_to_distinct_primaries_with_shared_fallback() {
        assert_eq!(Tier::Fast.primary(), Model::ClaudeHaiku45);
        assert_eq!(Tier::Capable.primary(), Model::ClaudeSonnet45);
        assert_eq!(Tier::Fast.fallback(), Model::ClaudeSonnet4);
        assert_eq!(Tier::Capable.fallback(), Model::ClaudeSonnet4);
    }
}
