//! Risk tiers and the first-match classification of a hazard ratio.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Very High Risk")]
    VeryHigh,
}

impl RiskTier {
    /// Ascending scan order used by [`TierBounds::classify`].
    pub const ALL: [RiskTier; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
            Self::VeryHigh => "Very High Risk",
        }
    }

    /// Display colour as a hex triplet.
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#16a34a",
            Self::Medium => "#f59e0b",
            Self::High => "#ea580c",
            Self::VeryHigh => "#dc2626",
        }
    }

    /// The colour as normalised RGB components in `0.0..=1.0`.
    pub fn rgb(self) -> (f64, f64, f64) {
        let hex = &self.color()[1..];
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_or(0.0, |v| f64::from(v) / 255.0)
        };
        (channel(0..2), channel(2..4), channel(4..6))
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exclusive upper bounds of the three bounded tiers. Very High Risk is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBounds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for TierBounds {
    fn default() -> Self {
        Self {
            low: 2.5,
            medium: 4.0,
            high: 6.0,
        }
    }
}

impl TierBounds {
    /// Each tier paired with its exclusive upper bound, in scan order.
    pub fn scale(&self) -> [(RiskTier, f64); 4] {
        [
            (RiskTier::Low, self.low),
            (RiskTier::Medium, self.medium),
            (RiskTier::High, self.high),
            (RiskTier::VeryHigh, f64::INFINITY),
        ]
    }

    pub fn upper_bound(&self, tier: RiskTier) -> f64 {
        self.scale()
            .into_iter()
            .find(|(candidate, _)| *candidate == tier)
            .map_or(f64::INFINITY, |(_, bound)| bound)
    }

    /// First tier whose exclusive upper bound exceeds `hazard_ratio`. A ratio sitting
    /// exactly on a bound belongs to the tier above it.
    pub fn classify(&self, hazard_ratio: f64) -> RiskTier {
        self.scale()
            .into_iter()
            .find(|(_, bound)| hazard_ratio < *bound)
            .map_or(RiskTier::VeryHigh, |(tier, _)| tier)
    }

    pub fn validate(&self) -> Result<(), String> {
        let bounds = [self.low, self.medium, self.high];
        if let Some(bad) = bounds.iter().find(|b| !b.is_finite() || **b <= 0.0) {
            return Err(format!("tier bound {bad} must be finite and positive"));
        }
        if !(self.low < self.medium && self.medium < self.high) {
            return Err(format!(
                "tier bounds must be strictly ascending (got {}, {}, {})",
                self.low, self.medium, self.high
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_upper_tier() {
        let bounds = TierBounds::default();
        assert_eq!(bounds.classify(2.5), RiskTier::Medium);
        assert_eq!(bounds.classify(4.0), RiskTier::High);
        assert_eq!(bounds.classify(6.0), RiskTier::VeryHigh);
    }

    #[test]
    fn interior_values_classify_by_first_match() {
        let bounds = TierBounds::default();
        assert_eq!(bounds.classify(0.1), RiskTier::Low);
        assert_eq!(bounds.classify(1.0), RiskTier::Low);
        assert_eq!(bounds.classify(2.499_999), RiskTier::Low);
        assert_eq!(bounds.classify(3.677), RiskTier::Medium);
        assert_eq!(bounds.classify(5.999), RiskTier::High);
        assert_eq!(bounds.classify(1e9), RiskTier::VeryHigh);
        assert_eq!(bounds.classify(f64::INFINITY), RiskTier::VeryHigh);
    }

    #[test]
    fn labels_round_trip_and_colors_decode() {
        for tier in RiskTier::ALL {
            assert_eq!(RiskTier::from_label(tier.label()), Some(tier));
        }
        assert_eq!(RiskTier::from_label("very high risk"), Some(RiskTier::VeryHigh));
        assert_eq!(RiskTier::from_label("Extreme"), None);

        let (r, g, b) = RiskTier::VeryHigh.rgb();
        assert!((r - 220.0 / 255.0).abs() < 1e-12);
        assert!((g - 38.0 / 255.0).abs() < 1e-12);
        assert!((b - 38.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_unordered_or_non_finite_bounds() {
        assert!(TierBounds::default().validate().is_ok());
        let unordered = TierBounds {
            low: 4.0,
            medium: 2.5,
            high: 6.0,
        };
        assert!(unordered.validate().is_err());
        let infinite = TierBounds {
            high: f64::INFINITY,
            ..TierBounds::default()
        };
        assert!(infinite.validate().is_err());
        let equal = TierBounds {
            medium: 2.5,
            ..TierBounds::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn upper_bounds_match_scale() {
        let bounds = TierBounds::default();
        assert_eq!(bounds.upper_bound(RiskTier::Low), 2.5);
        assert_eq!(bounds.upper_bound(RiskTier::High), 6.0);
        assert!(bounds.upper_bound(RiskTier::VeryHigh).is_infinite());
    }
}
