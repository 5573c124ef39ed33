use anyhow::anyhow;
use thiserror::Error;

/// Failure of one text-generation call.
///
/// The split drives the model routing in [`crate::ai::BedrockGenerator`]:
/// a retryable failure (throttling, model warm-up, transport) is worth the
/// single attempt against the tier's fallback model, while a terminal one
/// (malformed request, undecodable extraction output) would fail there too.
/// The save pipeline collapses both to a zeroed extraction either way.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("retryable generation failure: {0}")]
    Retryable(anyhow::Error),

    #[error("terminal generation failure: {0}")]
    Terminal(anyhow::Error),
}

impl From<serde_json::Error> for AiError {
    /// Model output that fails to decode is terminal: re-running the decode
    /// cannot change the text, and re-prompting is the caller's decision.
    fn from(source: serde_json::Error) -> Self {
        Self::Terminal(anyhow!(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_terminal() {
        let decode_err = serde_json::from_str::<serde_json::Value>("응, 기억할게!").unwrap_err();
        assert!(matches!(AiError::from(decode_err), AiError::Terminal(_)));
    }
}
