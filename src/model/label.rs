//! Classification labels attached to drawn rectangles.

use serde::{Deserialize, Serialize};

/// Kind of smoke a positive box shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokeType {
    Wildfire,
    Industrial,
    Other,
}

impl SmokeType {
    /// Get the display name for this smoke type.
    pub fn name(&self) -> &'static str {
        match self {
            SmokeType::Wildfire => "Wildfire",
            SmokeType::Industrial => "Industrial",
            SmokeType::Other => "Other",
        }
    }

    /// All smoke types in hotkey order (label 1, 2, 3).
    pub fn all() -> &'static [SmokeType] {
        &[SmokeType::Wildfire, SmokeType::Industrial, SmokeType::Other]
    }

    /// Resolve a 1-based label hotkey index.
    pub fn from_hotkey_index(n: usize) -> Option<SmokeType> {
        n.checked_sub(1).and_then(|i| Self::all().get(i).copied())
    }
}

/// Source of a false alarm on a negative box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalsePositiveType {
    Antenna,
    Building,
    Cliff,
    Dark,
    Dust,
    HighCloud,
    LowCloud,
    LensFlare,
    LensDroplet,
    Light,
    Rain,
    Trail,
    Road,
    Sky,
    Tree,
    WaterBody,
    Other,
}

impl FalsePositiveType {
    pub fn name(&self) -> &'static str {
        match self {
            FalsePositiveType::Antenna => "Antenna",
            FalsePositiveType::Building => "Building",
            FalsePositiveType::Cliff => "Cliff",
            FalsePositiveType::Dark => "Dark",
            FalsePositiveType::Dust => "Dust",
            FalsePositiveType::HighCloud => "High cloud",
            FalsePositiveType::LowCloud => "Low cloud",
            FalsePositiveType::LensFlare => "Lens flare",
            FalsePositiveType::LensDroplet => "Lens droplet",
            FalsePositiveType::Light => "Light",
            FalsePositiveType::Rain => "Rain",
            FalsePositiveType::Trail => "Trail",
            FalsePositiveType::Road => "Road",
            FalsePositiveType::Sky => "Sky",
            FalsePositiveType::Tree => "Tree",
            FalsePositiveType::WaterBody => "Water body",
            FalsePositiveType::Other => "Other",
        }
    }
}

/// The classification carried by a rectangle.
///
/// Only a fully resolved label counts towards annotation progress: a smoke
/// box needs its [`SmokeType`], a false positive needs at least one tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoxLabel {
    /// Not yet reviewed.
    #[default]
    Unreviewed,
    /// Flagged as smoke, optionally with its resolved type.
    Smoke { smoke_type: Option<SmokeType> },
    /// Flagged as a false alarm with zero or more causes.
    FalsePositive { types: Vec<FalsePositiveType> },
}

impl BoxLabel {
    /// A resolved smoke label.
    pub fn smoke(smoke_type: SmokeType) -> Self {
        BoxLabel::Smoke {
            smoke_type: Some(smoke_type),
        }
    }

    /// A false-positive label with the given causes.
    pub fn false_positive(types: impl IntoIterator<Item = FalsePositiveType>) -> Self {
        BoxLabel::FalsePositive {
            types: types.into_iter().collect(),
        }
    }

    /// Whether the label has been resolved down to its sub-label.
    pub fn is_resolved(&self) -> bool {
        match self {
            BoxLabel::Unreviewed => false,
            BoxLabel::Smoke { smoke_type } => smoke_type.is_some(),
            BoxLabel::FalsePositive { types } => !types.is_empty(),
        }
    }

    pub fn is_smoke(&self) -> bool {
        matches!(self, BoxLabel::Smoke { .. })
    }

    pub fn smoke_type(&self) -> Option<SmokeType> {
        match self {
            BoxLabel::Smoke { smoke_type } => *smoke_type,
            _ => None,
        }
    }

    pub fn false_positive_types(&self) -> &[FalsePositiveType] {
        match self {
            BoxLabel::FalsePositive { types } => types,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_index_is_one_based() {
        assert_eq!(SmokeType::from_hotkey_index(0), None);
        assert_eq!(SmokeType::from_hotkey_index(1), Some(SmokeType::Wildfire));
        assert_eq!(SmokeType::from_hotkey_index(3), Some(SmokeType::Other));
        assert_eq!(SmokeType::from_hotkey_index(4), None);
    }

    #[test]
    fn test_partial_classification_is_unresolved() {
        assert!(!BoxLabel::Unreviewed.is_resolved());
        assert!(!BoxLabel::Smoke { smoke_type: None }.is_resolved());
        assert!(!BoxLabel::false_positive([]).is_resolved());
        assert!(BoxLabel::smoke(SmokeType::Industrial).is_resolved());
        assert!(BoxLabel::false_positive([FalsePositiveType::LowCloud]).is_resolved());
    }

    #[test]
    fn test_label_json_shape() {
        let json = serde_json::to_string(&BoxLabel::smoke(SmokeType::Wildfire)).unwrap();
        assert_eq!(json, r#"{"kind":"smoke","smoke_type":"wildfire"}"#);
    }
}
