use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;

/// Risk tier derived from the Behavior Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High];

    /// Label used in the output CSV and the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }

    /// Chart color for this tier (banking palette)
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#27AE60",
            Self::Medium => "#F1C40F",
            Self::High => "#E74C3C",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Score thresholds partitioning the score axis into the three tiers
///
///   score >= low_floor            -> Low
///   medium_floor <= score < low_floor -> Medium
///   score < medium_floor          -> High
#[derive(Debug, Clone)]
pub struct RiskBands {
    low_floor: f64,
    medium_floor: f64,
}

impl RiskBands {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            low_floor: config.low_floor,
            medium_floor: config.medium_floor,
        }
    }

    pub fn categorize(&self, score: f64) -> RiskCategory {
        if score >= self.low_floor {
            RiskCategory::Low
        } else if score >= self.medium_floor {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    pub fn low_floor(&self) -> f64 {
        self.low_floor
    }

    pub fn medium_floor(&self) -> f64 {
        self.medium_floor
    }

    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "low_floor": self.low_floor,
            "medium_floor": self.medium_floor,
        })
    }
}
