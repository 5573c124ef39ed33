pub mod ai;
pub mod config;
pub mod memory;
pub mod store;
pub mod types;

// Public library API - the conversation loop should only need these.
pub use ai::{AiError, BedrockGenerator, GenerationRequest, TextGenerator, Tier};
pub use config::MemoryConfig;
pub use memory::{MemoryManager, SaveOutcome, StepStatus};
pub use store::{BlobStore, DocumentStore, DynamoDocumentStore, S3BlobStore};
pub use types::{ChatTurn, ConversationRecord, MemoryFact, TurnRole, UserProfile};
