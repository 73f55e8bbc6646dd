//! Labels - ordered categories over the 0-100 scale
//!
//! | Label | Range |
//! |-------|-------|
//! | calm | [0, 20) |
//! | somewhat-calm | [20, 40) |
//! | normal | [40, 60) |
//! | somewhat-overheated | [60, 75) |
//! | overheated | [75, 90) |
//! | extreme-overheated | [90, 100] |
//!
//! Each threshold belongs to the higher bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an index value, ordered from calmest to hottest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    Calm,
    SomewhatCalm,
    Normal,
    SomewhatOverheated,
    Overheated,
    ExtremeOverheated,
}

impl Label {
    /// Classify a value. Values below 0 fall into `Calm`, above 100 into
    /// `ExtremeOverheated`; NaN is treated as `Normal`.
    pub fn classify(value: f64) -> Self {
        if value.is_nan() {
            return Self::Normal;
        }
        if value >= 90.0 {
            Self::ExtremeOverheated
        } else if value >= 75.0 {
            Self::Overheated
        } else if value >= 60.0 {
            Self::SomewhatOverheated
        } else if value >= 40.0 {
            Self::Normal
        } else if value >= 20.0 {
            Self::SomewhatCalm
        } else {
            Self::Calm
        }
    }

    /// Inclusive lower bound of this bucket
    pub fn lower_bound(&self) -> f64 {
        match self {
            Self::Calm => 0.0,
            Self::SomewhatCalm => 20.0,
            Self::Normal => 40.0,
            Self::SomewhatOverheated => 60.0,
            Self::Overheated => 75.0,
            Self::ExtremeOverheated => 90.0,
        }
    }

    /// All labels, calmest first
    pub fn all() -> [Self; 6] {
        [
            Self::Calm,
            Self::SomewhatCalm,
            Self::Normal,
            Self::SomewhatOverheated,
            Self::Overheated,
            Self::ExtremeOverheated,
        ]
    }

    /// Wire name, as written to reading files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::SomewhatCalm => "somewhat-calm",
            Self::Normal => "normal",
            Self::SomewhatOverheated => "somewhat-overheated",
            Self::Overheated => "overheated",
            Self::ExtremeOverheated => "extreme-overheated",
        }
    }

    /// Name shown on the public site
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Calm => "静穏",
            Self::SomewhatCalm => "やや冷静",
            Self::Normal => "平常",
            Self::SomewhatOverheated => "やや過熱",
            Self::Overheated => "過熱",
            Self::ExtremeOverheated => "極度の過熱",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_promote() {
        assert_eq!(Label::classify(19.999), Label::Calm);
        assert_eq!(Label::classify(20.0), Label::SomewhatCalm);
        assert_eq!(Label::classify(39.999), Label::SomewhatCalm);
        assert_eq!(Label::classify(40.0), Label::Normal);
        assert_eq!(Label::classify(60.0), Label::SomewhatOverheated);
        assert_eq!(Label::classify(75.0), Label::Overheated);
        assert_eq!(Label::classify(89.999), Label::Overheated);
        assert_eq!(Label::classify(90.0), Label::ExtremeOverheated);
        assert_eq!(Label::classify(100.0), Label::ExtremeOverheated);
        assert_eq!(Label::classify(0.0), Label::Calm);
    }

    #[test]
    fn test_partition_is_monotonic_and_total() {
        let mut prev = Label::Calm;
        let mut seen = std::collections::BTreeSet::new();
        for i in 0..=1000 {
            let v = i as f64 / 10.0;
            let label = Label::classify(v);
            assert!(label >= prev, "{} went from {} to {}", v, prev, label);
            assert!(v >= label.lower_bound());
            prev = label;
            seen.insert(label);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_lower_bounds_classify_to_self() {
        for label in Label::all() {
            assert_eq!(Label::classify(label.lower_bound()), label);
        }
    }

    #[test]
    fn test_display_names() {
        let names: Vec<_> = Label::all().into_iter().map(|l| l.display_name()).collect();
        assert_eq!(
            names,
            vec!["静穏", "やや冷静", "平常", "やや過熱", "過熱", "極度の過熱"]
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Label::SomewhatOverheated).unwrap();
        assert_eq!(json, "\"somewhat-overheated\"");
        for label in Label::all() {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
        }
    }
}
