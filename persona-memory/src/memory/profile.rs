//! User profile lookup, creation, and partial updates.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::memory::MemoryManager;
use crate::store::{DocumentKey, Patch, StoreError};
use crate::types::UserProfile;

impl MemoryManager {
    fn user_key(user_id: &str) -> DocumentKey {
        DocumentKey::simple("user_id", user_id)
    }

    pub(crate) async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfile>, StoreError> {
        let table = &self.config().tables.users;
        let Some(item) = self.documents().get(table, &Self::user_key(user_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(item)?))
    }

    /// Profile lookup. Store failures degrade to `None`.
    pub async fn get_user_profile(&self, user_id: &str) -> Option<UserProfile> {
        match self.fetch_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(user_id, error = %e, "profile lookup failed");
                None
            }
        }
    }

    /// Login-time lookup-or-create. Existing users get their login timestamp
    /// refreshed and session counter bumped; new users get a zeroed profile
    /// with onboarding at step 0. A failed write still returns the
    /// constructed profile so the session can proceed.
    pub async fn get_or_create_user(
        &self,
        user_id: &str,
        email: &str,
        display_name: &str,
    ) -> UserProfile {
        let now = Utc::now();
        let table = self.config().tables.users.clone();

        match self.fetch_profile(user_id).await {
            Ok(Some(profile)) => {
                let patch = Patch::new()
                    .set("last_login_at", Value::String(now.to_rfc3339()))
                    .increment("total_sessions");
                if let Err(e) = self
                    .documents()
                    .update(&table, &Self::user_key(user_id), patch)
                    .await
                {
                    tracing::error!(user_id, error = %e, "login bump failed");
                }
                return profile;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(user_id, error = %e, "profile lookup failed, creating fresh");
            }
        }

        let profile = UserProfile {
            user_id: user_id.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            nickname: String::new(),
            birthday: String::new(),
            interests: Vec::new(),
            kpop_preferences: Map::new(),
            preferred_topics: Vec::new(),
            gender: None,
            onboarding_step: 0,
            onboarding_complete: false,
            created_at: now,
            updated_at: now,
            last_login_at: now,
            total_sessions: 1,
        };

        match serde_json::to_value(&profile) {
            Ok(item) => {
                if let Err(e) = self.documents().put(&table, item).await {
                    tracing::error!(user_id, error = %e, "profile creation failed");
                }
            }
            Err(e) => tracing::error!(user_id, error = %e, "profile serialization failed"),
        }
        profile
    }

    /// Partial profile update, stamping `updated_at`. Last writer wins.
    pub(crate) async fn apply_profile_updates(
        &self,
        user_id: &str,
        updates: Map<String, Value>,
    ) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut patch = Patch::new().set("updated_at", Value::String(Utc::now().to_rfc3339()));
        for (field, value) in updates {
            patch = patch.set(field, value);
        }

        self.documents()
            .update(&self.config().tables.users, &Self::user_key(user_id), patch)
            .await
    }

    /// Public partial update; failures are logged and swallowed.
    pub async fn update_user_profile(&self, user_id: &str, updates: Map<String, Value>) {
        if let Err(e) = self.apply_profile_updates(user_id, updates).await {
            tracing::error!(user_id, error = %e, "profile update failed");
        }
    }
}
