use serde::{Deserialize, Serialize};

use crate::ai::{error::AiError, model::Tier};

/// One prompt-in, text-out generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub tier: Tier,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn fast(prompt: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            prompt,
            tier: Tier::Fast,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError>;
}
