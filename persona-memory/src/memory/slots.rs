//! Generic slot-filling controller.
//!
//! Onboarding and profile completion are the same mechanism — ask for a
//! profile field inside normal conversation, judge the answer with a cheap
//! model call, write the field — differing only in discipline: onboarding
//! walks an ordered slot sequence behind a step cursor, profile completion
//! opportunistically fills whatever is still missing, gated on extraction
//! confidence. Both instantiate [`SlotFiller`].

use serde::Deserialize;

use crate::types::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSlot {
    Nickname,
    Birthday,
    Interests,
    KpopPreferences,
    PreferredTopics,
    Gender,
}

impl ProfileSlot {
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Nickname => "nickname",
            Self::Birthday => "birthday",
            Self::Interests => "interests",
            Self::KpopPreferences => "kpop_preferences",
            Self::PreferredTopics => "preferred_topics",
            Self::Gender => "gender",
        }
    }

    pub fn is_filled(self, profile: &UserProfile) -> bool {
        match self {
            Self::Nickname => !profile.nickname.is_empty(),
            Self::Birthday => !profile.birthday.is_empty(),
            Self::Interests => !profile.interests.is_empty(),
            Self::KpopPreferences => !profile.kpop_preferences.is_empty(),
            Self::PreferredTopics => !profile.preferred_topics.is_empty(),
            Self::Gender => profile.gender.is_some(),
        }
    }
}

/// One collectible profile field plus the conversational instruction the
/// persona receives for asking about it.
#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub slot: ProfileSlot,
    pub instruction: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDiscipline {
    /// Slots fill one at a time behind an externally stored step cursor.
    Sequential,
    /// Any still-unfilled slot may fill on any turn.
    Opportunistic,
}

pub struct SlotFiller {
    pub discipline: SlotDiscipline,
    pub slots: &'static [SlotSpec],
}

impl SlotFiller {
    pub const fn new(discipline: SlotDiscipline, slots: &'static [SlotSpec]) -> Self {
        Self { discipline, slots }
    }

    /// Slots eligible for collection this turn. `cursor` is only meaningful
    /// for the sequential discipline; out-of-range cursors yield nothing.
    pub fn pending(&self, profile: &UserProfile, cursor: usize) -> Vec<&SlotSpec> {
        match self.discipline {
            SlotDiscipline::Sequential => self.slots.get(cursor).into_iter().collect(),
            SlotDiscipline::Opportunistic => self
                .slots
                .iter()
                .filter(|spec| !spec.slot.is_filled(profile))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Extraction confidence label for opportunistic slot fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}
