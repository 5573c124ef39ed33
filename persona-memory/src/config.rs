//! Memory subsystem configuration.
//!
//! Constructed once at startup and passed by reference into each component;
//! nothing in this crate reads configuration from globals.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
    #[serde(default = "default_users_table")]
    pub users: String,
    #[serde(default = "default_conversations_table")]
    pub conversations: String,
    #[serde(default = "default_memories_table")]
    pub memories: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            users: default_users_table(),
            conversations: default_conversations_table(),
            memories: default_memories_table(),
        }
    }
}

fn default_users_table() -> String {
    "CharacterChatbot-Users".to_string()
}

fn default_conversations_table() -> String {
    "CharacterChatbot-Conversations".to_string()
}

fn default_memories_table() -> String {
    "CharacterChatbot-Memories".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub tables: TableNames,
    /// Hard character budget for the assembled context block.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
    /// Maximum ranked memories injected into one context.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,
    /// Maximum recent conversation summaries injected into one context.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
    /// Accrued turns that trigger the full save pipeline.
    #[serde(default = "default_full_save_turn_threshold")]
    pub full_save_turn_threshold: usize,
    /// Trailing turns fed to onboarding / profile-completion judgment calls.
    #[serde(default = "default_judge_window")]
    pub judge_window: usize,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_context_char_budget() -> usize {
    4000
}

fn default_memory_limit() -> usize {
    15
}

fn default_summary_limit() -> usize {
    5
}

fn default_full_save_turn_threshold() -> usize {
    6
}

fn default_judge_window() -> usize {
    4
}

impl Default for MemoryConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl MemoryConfig {
    /// Load configuration from a TOML file. Missing fields fall back to
    /// defaults; the `S3_BUCKET_NAME` environment variable overrides the
    /// bucket so deployments can rebind storage without editing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bucket) = std::env::var("S3_BUCKET_NAME") {
            if !bucket.is_empty() {
                self.bucket_name = bucket;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_production_constants() {
        let config = MemoryConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.tables.users, "CharacterChatbot-Users");
        assert_eq!(config.tables.conversations, "CharacterChatbot-Conversations");
        assert_eq!(config.tables.memories, "CharacterChatbot-Memories");
        assert_eq!(config.context_char_budget, 4000);
        assert_eq!(config.memory_limit, 15);
        assert_eq!(config.summary_limit, 5);
        assert_eq!(config.full_save_turn_threshold, 6);
        assert_eq!(config.judge_window, 4);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bucket_name = \"persona-chat-logs\"").unwrap();
        writeln!(file, "[tables]").unwrap();
        writeln!(file, "memories = \"Persona-Memories\"").unwrap();

        let config = MemoryConfig::load(file.path()).unwrap();
        assert_eq!(config.bucket_name, "persona-chat-logs");
        assert_eq!(config.tables.memories, "Persona-Memories");
        assert_eq!(config.tables.users, "CharacterChatbot-Users");
        assert_eq!(config.memory_limit, 15);
    }
}
