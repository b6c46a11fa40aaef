use crate::config::TierThresholds;
use crate::features::Flag;
use crate::script::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered risk tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Safe,
    LowRisk,
    Suspicious,
    HighRisk,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Safe,
        RiskTier::LowRisk,
        RiskTier::Suspicious,
        RiskTier::HighRisk,
    ];

    /// Stable identifier, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "SAFE",
            RiskTier::LowRisk => "LOW_RISK",
            RiskTier::Suspicious => "SUSPICIOUS",
            RiskTier::HighRisk => "HIGH_RISK",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, RiskTier::Safe) => "Safe",
            (Language::En, RiskTier::LowRisk) => "Low risk",
            (Language::En, RiskTier::Suspicious) => "Suspicious",
            (Language::En, RiskTier::HighRisk) => "High risk",
            (Language::Ar, RiskTier::Safe) => "آمن",
            (Language::Ar, RiskTier::LowRisk) => "خطر منخفض",
            (Language::Ar, RiskTier::Suspicious) => "مشبوه",
            (Language::Ar, RiskTier::HighRisk) => "خطر عالٍ",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        RiskTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == normalized)
            .ok_or_else(|| format!("unknown risk tier '{}'", s))
    }
}

pub struct Classifier {
    thresholds: TierThresholds,
    max_display_flags: usize,
}

impl Classifier {
    pub fn new(thresholds: TierThresholds, max_display_flags: usize) -> Self {
        Self {
            thresholds,
            max_display_flags,
        }
    }

    pub fn classify(&self, score: u8) -> RiskTier {
        if score <= self.thresholds.safe_max {
            RiskTier::Safe
        } else if score <= self.thresholds.low_risk_max {
            RiskTier::LowRisk
        } else if score <= self.thresholds.suspicious_max {
            RiskTier::Suspicious
        } else {
            RiskTier::HighRisk
        }
    }

    /// Inclusive score range that maps to `tier`
    pub fn range_for(&self, tier: RiskTier) -> (u8, u8) {
        let t = &self.thresholds;
        match tier {
            RiskTier::Safe => (0, t.safe_max),
            RiskTier::LowRisk => (t.safe_max + 1, t.low_risk_max),
            RiskTier::Suspicious => (t.low_risk_max + 1, t.suspicious_max),
            RiskTier::HighRisk => (t.suspicious_max + 1, 100),
        }
    }

    /// Flags kept for display, insertion order preserved
    pub fn display_flags(&self, mut flags: Vec<Flag>) -> Vec<Flag> {
        flags.truncate(self.max_display_flags);
        flags
    }
}
