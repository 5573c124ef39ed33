use std::sync::{Arc, Mutex};

use crate::ai::{
    error::AiError,
    provider::{GenerationRequest, TextGenerator},
};

/// Mock behavior for the mock generator
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockBehavior {
    /// Return the same text for every call
    Reply { text: String },
    /// Always fail with a terminal error
    AlwaysFail,
    /// Fail N times with retryable errors, then return the text
    FailThenReply { remaining_errors: usize, text: String },
    /// Pop behaviors off a queue, one per call; empty queue returns ""
    BehaviorQueue { behaviors: Vec<MockBehavior> },
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Reply {
            text: String::new(),
        }
    }
}

/// Mock text generator for testing
#[derive(Clone, Default)]
pub struct MockGenerator {
    behavior: Arc<Mutex<MockBehavior>>,
    call_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue of scripted replies, one per call.
    pub fn scripted(replies: impl IntoIterator<Item = String>) -> Self {
        Self::new(MockBehavior::BehaviorQueue {
            behaviors: replies
                .into_iter()
                .map(|text| MockBehavior::Reply { text })
                .collect(),
        })
    }

    fn pop_behavior_from_queue(behavior: &mut MockBehavior) -> MockBehavior {
        if let MockBehavior::BehaviorQueue { behaviors } = behavior {
            if behaviors.is_empty() {
                return MockBehavior::default();
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_captured_requests(&self) -> Vec<GenerationRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    pub fn get_last_captured_request(&self) -> Option<GenerationRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError> {
        {
            let mut requests = self.captured_requests.lock().unwrap();
            requests.push(request.clone());
        }
        {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
        }

        let effective = {
            let mut behavior = self.behavior.lock().unwrap();
            Self::pop_behavior_from_queue(&mut behavior)
        };

        match effective {
            MockBehavior::Reply { text } => Ok(text),
            MockBehavior::AlwaysFail => {
                Err(AiError::Terminal(anyhow::anyhow!("mock terminal error")))
            }
            MockBehavior::FailThenReply {
                mut remaining_errors,
                text,
            } => {
                if remaining_errors > 0 {
                    remaining_errors -= 1;
                    self.set_behavior(MockBehavior::FailThenReply {
                        remaining_errors,
                        text,
                    });
                    Err(AiError::Retryable(anyhow::anyhow!(
                        "mock retryable error (remaining: {})",
                        remaining_errors
                    )))
                } else {
                    Ok(text)
                }
            }
            MockBehavior::BehaviorQueue { .. } => {
                panic!("Bug: nested BehaviorQueue detected. Test setup error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::model::Tier;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            tier: Tier::Fast,
            max_tokens: 100,
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn scripted_replies_pop_in_order() {
        let generator = MockGenerator::scripted(["one".to_string(), "two".to_string()]);

        assert_eq!(generator.generate(request("a")).await.unwrap(), "one");
        assert_eq!(generator.generate(request("b")).await.unwrap(), "two");
        // Exhausted queue degrades to empty text
        assert_eq!(generator.generate(request("c")).await.unwrap(), "");
        assert_eq!(generator.get_call_count(), 3);
    }

    #[tokio::test]
    async fn fail_then_reply_counts_down() {
        let generator = MockGenerator::new(MockBehavior::FailThenReply {
            remaining_errors: 1,
            text: "ok".to_string(),
        });

        assert!(matches!(
            generator.generate(request("a")).await,
            Err(AiError::Retryable(_))
        ));
        assert_eq!(generator.generate(request("b")).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn captures_prompts() {
        let generator = MockGenerator::new(MockBehavior::Reply {
            text: "hi".to_string(),
        });
        generator.generate(request("inspect me")).await.unwrap();

        let captured = generator.get_last_captured_request().unwrap();
        assert_eq!(captured.prompt, "inspect me");
    }
}
