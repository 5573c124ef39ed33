use aws_sdk_bedrockruntime::{
    error::SdkError,
    operation::converse::ConverseError,
    types::{ContentBlock, ConversationRole, InferenceConfiguration, Message},
    Client as BedrockClient,
};

use crate::ai::{
    error::AiError,
    model::Model,
    provider::{GenerationRequest, TextGenerator},
};

/// Text generation over the Bedrock Converse API.
///
/// Every tier routes to a primary model; any failure on the primary is
/// retried exactly once against the tier's fallback model before the error
/// is propagated.
#[derive(Clone)]
pub struct BedrockGenerator {
    client: BedrockClient,
}

impl BedrockGenerator {
    pub fn new(client: BedrockClient) -> Self {
        Self { client }
    }

    pub async fn from_env(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(BedrockClient::new(&config))
    }

    async fn invoke(&self, model: Model, request: &GenerationRequest) -> Result<String, AiError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(request.prompt.clone()))
            .build()
            .map_err(|e| AiError::Terminal(anyhow::anyhow!("failed to build message: {e:?}")))?;

        let inference_config = InferenceConfiguration::builder()
            .max_tokens(request.max_tokens as i32)
            .temperature(request.temperature)
            .build();

        let response = self
            .client
            .converse()
            .model_id(model.bedrock_model_id())
            .messages(message)
            .inference_config(inference_config)
            .send()
            .await
            .map_err(classify_error)?;

        let output = response
            .output()
            .ok_or_else(|| AiError::Terminal(anyhow::anyhow!("converse returned no output")))?;
        let message = output.as_message().map_err(|_| {
            AiError::Terminal(anyhow::anyhow!("converse output was not a message"))
        })?;

        let text: String = message
            .content()
            .iter()
            .filter_map(|block| block.as_text().ok().cloned())
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}

fn classify_error(error: SdkError<ConverseError>) -> AiError {
    match &error {
        SdkError::ServiceError(service_error) => {
            let inner = service_error.err();
            if inner.is_throttling_exception()
                || inner.is_service_unavailable_exception()
                || inner.is_model_not_ready_exception()
            {
                AiError::Retryable(anyhow::anyhow!(error))
            } else {
                AiError::Terminal(anyhow::anyhow!(error))
            }
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            AiError::Retryable(anyhow::anyhow!(error))
        }
        _ => AiError::Terminal(anyhow::anyhow!(error)),
    }
}

#[async_trait::async_trait]
impl TextGenerator for BedrockGenerator {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError> {
        let primary = request.tier.primary();
        match self.invoke(primary, &request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                let fallback = request.tier.fallback();
                tracing::warn!(
                    primary = primary.name(),
                    fallback = fallback.name(),
                    error = %e,
                    "primary model failed, retrying against fallback"
                );
                self.invoke(fallback, &request).await
            }
        }
    }
}
