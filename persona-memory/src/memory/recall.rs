//! Memory retrieval and ranking.

use chrono::Utc;
use serde_json::Value;

use crate::memory::MemoryManager;
use crate::store::{DocumentKey, Patch, Query, StoreError};
use crate::types::{ConversationRecord, MemoryFact, GLOBAL_SCOPE};

const CHARACTER_MEMORY_INDEX: &str = "CharacterMemoryIndex";
const CHARACTER_TIME_INDEX: &str = "CharacterTimeIndex";

impl MemoryManager {
    /// Active global + character-scoped facts, sorted by importance
    /// descending (stable on ties) and cut to `limit`. Not read-only: every
    /// returned fact gets its reference count and last-referenced timestamp
    /// bumped; facts below the cutoff are untouched. Query failures degrade
    /// to an empty list.
    pub async fn rank_memories(
        &self,
        user_id: &str,
        character: &str,
        limit: usize,
    ) -> Vec<MemoryFact> {
        let mut facts = match self.fetch_scoped_facts(user_id, GLOBAL_SCOPE).await {
            Ok(facts) => facts,
            Err(e) => {
                tracing::error!(user_id, error = %e, "global memory query failed");
                return Vec::new();
            }
        };
        match self.fetch_scoped_facts(user_id, character).await {
            Ok(scoped) => facts.extend(scoped),
            Err(e) => {
                tracing::error!(user_id, character, error = %e, "character memory query failed");
                return Vec::new();
            }
        }

        facts.sort_by(|a, b| b.importance.cmp(&a.importance));
        facts.truncate(limit);

        // Reference bookkeeping on the returned facts only, best-effort.
        let now = Utc::now().to_rfc3339();
        for fact in &facts {
            let key = DocumentKey::composite("user_id", user_id, "memory_id", &fact.memory_id);
            let patch = Patch::new()
                .set("last_referenced", Value::String(now.clone()))
                .increment("reference_count");
            if let Err(e) = self
                .documents()
                .update(&self.config().tables.memories, &key, patch)
                .await
            {
                tracing::debug!(memory_id = %fact.memory_id, error = %e, "reference bump failed");
            }
        }

        facts
    }

    async fn fetch_scoped_facts(
        &self,
        user_id: &str,
        scope: &str,
    ) -> Result<Vec<MemoryFact>, StoreError> {
        let items = self
            .documents()
            .query(
                &self.config().tables.memories,
                Query::partition("user_id", user_id)
                    .index(CHARACTER_MEMORY_INDEX)
                    .key_eq("character", scope)
                    .filter_eq("active", Value::Bool(true)),
            )
            .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(fact) => Some(fact),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "skipping undecodable memory fact");
                    None
                }
            })
            .collect())
    }

    /// The `limit` most recent conversation records for this exact
    /// character, newest first. Summaries are always character-scoped; the
    /// global sentinel does not apply here.
    pub async fn recent_summaries(
        &self,
        user_id: &str,
        character: &str,
        limit: usize,
    ) -> Vec<ConversationRecord> {
        let result = self
            .documents()
            .query(
                &self.config().tables.conversations,
                Query::partition("user_id", user_id)
                    .index(CHARACTER_TIME_INDEX)
                    .filter_eq("character", Value::String(character.to_string()))
                    .descending()
                    .limit(limit),
            )
            .await;

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(user_id, character, error = %e, "summary query failed");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "skipping undecodable conversation record");
                    None
                }
            })
            .collect()
    }
}
