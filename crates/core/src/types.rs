//! Core type definitions shared across Dining Gateway services

use serde::{Deserialize, Serialize};

/// Kind of a recorded user-item interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Order,
    Rating,
    Favorite,
}

/// Spice level of a menu item, ordered by heat
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    Medium,
    Hot,
    VeryHot,
}

/// Dietary classification tags for menu items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryTag {
    Vegetarian,
    Vegan,
    Halal,
    GlutenFree,
    DairyFree,
}

/// Qualitative reliability label attached to a recommendation.
///
/// Ordered: `Low < Medium < High`. Fusion across generators is the rounded
/// mean of the ordinal values, so the result of combining confidences is a
/// pure function of the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Ordinal value used for fusion arithmetic
    pub fn ordinal(self) -> u8 {
        match self {
            Confidence::Low => 1,
            Confidence::Medium => 2,
            Confidence::High => 3,
        }
    }

    /// Map an ordinal value back to a label, clamping out-of-range input
    pub fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 | 1 => Confidence::Low,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }

    /// Fuse a set of confidence labels into one: rounded mean of ordinals.
    ///
    /// Returns `Medium` for an empty input.
    pub fn fuse(labels: impl IntoIterator<Item = Confidence>) -> Self {
        let mut sum = 0u32;
        let mut count = 0u32;
        for label in labels {
            sum += u32::from(label.ordinal());
            count += 1;
        }
        if count == 0 {
            return Confidence::Medium;
        }
        let mean = sum as f32 / count as f32;
        Confidence::from_ordinal(mean.round() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_confidence_fuse_pairs() {
        // (1 + 3) / 2 = 2 -> medium
        assert_eq!(
            Confidence::fuse([Confidence::Low, Confidence::High]),
            Confidence::Medium
        );
        // (2 + 3) / 2 = 2.5, rounds to 3 -> high
        assert_eq!(
            Confidence::fuse([Confidence::Medium, Confidence::High]),
            Confidence::High
        );
        // (1 + 2) / 2 = 1.5, rounds to 2 -> medium
        assert_eq!(
            Confidence::fuse([Confidence::Low, Confidence::Medium]),
            Confidence::Medium
        );
    }

    #[test]
    fn test_confidence_fuse_identity() {
        for label in [Confidence::Low, Confidence::Medium, Confidence::High] {
            assert_eq!(Confidence::fuse([label, label, label]), label);
        }
    }

    #[test]
    fn test_confidence_fuse_empty_defaults_to_medium() {
        assert_eq!(Confidence::fuse([]), Confidence::Medium);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&SpiceLevel::VeryHot).unwrap();
        assert_eq!(json, "\"very_hot\"");
        let tag: DietaryTag = serde_json::from_str("\"gluten_free\"").unwrap();
        assert_eq!(tag, DietaryTag::GlutenFree);
    }
}
