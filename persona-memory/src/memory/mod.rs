//! Long-term memory subsystem.
//!
//! [`MemoryManager`] is the facade the conversation loop talks to: context
//! assembly before a reply, transcript persistence after every turn, the
//! full extraction pipeline once enough turns accrue, and the onboarding /
//! profile-completion judgment passes. Every public method upholds the
//! silent-degradation contract: adapter failures are logged and collapse to
//! neutral defaults, never to an error the chat loop has to handle.

use std::sync::Arc;

use crate::ai::TextGenerator;
use crate::config::MemoryConfig;
use crate::store::{BlobStore, DocumentStore};

pub mod completion;
pub mod context;
pub mod extraction;
pub mod onboarding;
pub mod profile;
pub mod prompt;
pub mod recall;
pub mod save;
pub mod slots;

pub use extraction::{ConversationExtraction, ExtractedMemory};
pub use save::{SaveOutcome, StepStatus};
pub use slots::{Confidence, ProfileSlot, SlotDiscipline, SlotFiller, SlotSpec};

pub struct MemoryManager {
    config: MemoryConfig,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    generator: Arc<dyn TextGenerator>,
}

impl MemoryManager {
    pub fn new(
        config: MemoryConfig,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            documents,
            blobs,
            generator,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub(crate) fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub(crate) fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub(crate) fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Whether the caller should run the full save pipeline, given how many
    /// turns accrued since the last full save.
    pub fn full_save_due(&self, turns_since_last_save: usize) -> bool {
        turns_since_last_save >= self.config.full_save_turn_threshold
    }
}
