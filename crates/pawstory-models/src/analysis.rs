//! Frame-level content analysis types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the pet and the human interact in a span of footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    RunningTowardsOwner,
    Playing,
    BeingPetted,
    Fetching,
    Cuddling,
    /// No interaction between pet and human.
    #[default]
    None,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::RunningTowardsOwner => "running_towards_owner",
            InteractionKind::Playing => "playing",
            InteractionKind::BeingPetted => "being_petted",
            InteractionKind::Fetching => "fetching",
            InteractionKind::Cuddling => "cuddling",
            InteractionKind::None => "none",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall emotional read of the pet in a span of footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Excited,
    Calm,
    #[default]
    Neutral,
    Sad,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Excited => "excited",
            Emotion::Calm => "calm",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured result of classifying a set of frames.
///
/// Produced once per segment (per-segment mode) or once per video and shared
/// by all of its segments (single-call mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub has_pet: bool,
    pub has_human: bool,
    pub interaction: InteractionKind,
    pub emotion: Emotion,
    pub caption: String,
}

impl Analysis {
    /// Neutral default substituted when a classification call fails.
    pub fn fallback() -> Self {
        Self {
            has_pet: false,
            has_human: false,
            interaction: InteractionKind::None,
            emotion: Emotion::Neutral,
            caption: "analysis unavailable".to_string(),
        }
    }

    /// Whether footage with this analysis counts towards a highlight:
    /// pet and human both present and actually interacting.
    pub fn is_qualifying(&self) -> bool {
        self.has_pet && self.has_human && self.interaction != InteractionKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_never_qualifies() {
        assert!(!Analysis::fallback().is_qualifying());
    }

    #[test]
    fn test_qualifying_requires_all_three() {
        let mut a = Analysis {
            has_pet: true,
            has_human: true,
            interaction: InteractionKind::Playing,
            emotion: Emotion::Happy,
            caption: "fetch in the park".to_string(),
        };
        assert!(a.is_qualifying());

        a.interaction = InteractionKind::None;
        assert!(!a.is_qualifying());

        a.interaction = InteractionKind::Playing;
        a.has_human = false;
        assert!(!a.is_qualifying());
    }

    #[test]
    fn test_interaction_serde_names() {
        let json = serde_json::to_string(&InteractionKind::RunningTowardsOwner).unwrap();
        assert_eq!(json, "\"running_towards_owner\"");
        let parsed: InteractionKind = serde_json::from_str("\"being_petted\"").unwrap();
        assert_eq!(parsed, InteractionKind::BeingPetted);
    }
}
