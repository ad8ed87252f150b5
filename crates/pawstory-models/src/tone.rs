//! Narrative tone selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Enumerated narrative style for generated narration.
///
/// Each mode carries a small strategy table ([`ToneProfile`]) the narration
/// prompt is assembled from, so adding a tone never duplicates prompt code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToneMode {
    /// First-person pet voice, wide-eyed and affectionate, like a small child.
    #[default]
    Playful,
    /// First-person pet voice, warm and sentimental.
    Heartfelt,
    /// Third-person observer voice, calm nature-film register.
    Documentary,
}

/// Prompt-building strategy for one tone mode.
#[derive(Debug, Clone, Copy)]
pub struct ToneProfile {
    /// Voice/persona instruction.
    pub style: &'static str,
    /// Emotional register instruction.
    pub register: &'static str,
    /// Few-shot example lines in this voice.
    pub examples: &'static [&'static str],
}

impl ToneMode {
    pub const ALL: &'static [ToneMode] =
        &[ToneMode::Playful, ToneMode::Heartfelt, ToneMode::Documentary];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneMode::Playful => "playful",
            ToneMode::Heartfelt => "heartfelt",
            ToneMode::Documentary => "documentary",
        }
    }

    /// Strategy table entry for this mode.
    pub fn profile(&self) -> ToneProfile {
        match self {
            ToneMode::Playful => ToneProfile {
                style: "Speak in the first person as the pet, with the voice of a \
                        three-year-old child: simple words, short sentences, direct and cute.",
                register: "Overflowing with love, joy and gratitude; the owner is the best \
                           person in the world.",
                examples: &[
                    "Look how fast I ran! I just wanted to jump into your arms sooner~",
                    "Being with you is my favourite thing. As long as you're here I'm happy!",
                ],
            },
            ToneMode::Heartfelt => ToneProfile {
                style: "Speak in the first person as the pet, gentle and sincere, \
                        like a letter written to the owner.",
                register: "Warm, tender and a little wistful; every moment together matters.",
                examples: &[
                    "Every afternoon nap next to you felt like the safest place on earth.",
                    "I may not have words, but I hope my eyes told you how much I love you.",
                ],
            },
            ToneMode::Documentary => ToneProfile {
                style: "Narrate in the third person as a calm wildlife-film narrator \
                        observing the pet and its human.",
                register: "Measured, fond and lightly humorous; let the footage carry the \
                           emotion.",
                examples: &[
                    "Here we observe the subject executing a flawless sock retrieval.",
                    "A rare moment of stillness, as predator and provider share the couch.",
                ],
            },
        }
    }
}

impl fmt::Display for ToneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToneMode {
    type Err = ToneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "playful" => Ok(ToneMode::Playful),
            "heartfelt" => Ok(ToneMode::Heartfelt),
            "documentary" => Ok(ToneMode::Documentary),
            _ => Err(ToneParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown tone mode: {0}")]
pub struct ToneParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for tone in ToneMode::ALL {
            assert_eq!(tone.as_str().parse::<ToneMode>().unwrap(), *tone);
        }
        assert!("sarcastic".parse::<ToneMode>().is_err());
    }

    #[test]
    fn test_every_profile_has_examples() {
        for tone in ToneMode::ALL {
            assert!(!tone.profile().examples.is_empty());
        }
    }
}
