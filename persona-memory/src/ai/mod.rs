pub mod bedrock;
pub mod error;
pub mod mock;
pub mod model;
pub mod provider;

pub use bedrock::BedrockGenerator;
pub use error::AiError;
pub use model::{Model, Tier};
pub use provider::{GenerationRequest, TextGenerator};
