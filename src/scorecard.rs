use crate::config::ScorecardConfig;

/// Log-odds scorecard scaling
///
/// Derived once from three calibration constants:
///   factor = pdo / ln(2)
///   offset = score_ref + factor * ln(odds)
///
/// A probability of default maps to a score via
///   score(p) = offset - factor * ln(p / (1 - p))
/// with p clamped to [pd_floor, pd_ceiling] so the log-odds stay finite.
/// Lower PD, higher score.
#[derive(Debug, Clone)]
pub struct ScorecardScale {
    config: ScorecardConfig,
    offset: f64,
    factor: f64,
}

impl ScorecardScale {
    pub fn new(config: &ScorecardConfig) -> Self {
        let factor = config.pdo / 2f64.ln();
        let offset = config.score_ref + factor * config.odds.ln();
        Self {
            config: config.clone(),
            offset,
            factor,
        }
    }

    /// Behavior Score for a probability of default
    pub fn score(&self, pd: f64) -> f64 {
        let pd = self.clamp_pd(pd);
        let odds = pd / (1.0 - pd);
        self.offset - self.factor * odds.ln()
    }

    /// Clamp a PD into the open transform interval
    pub fn clamp_pd(&self, pd: f64) -> f64 {
        pd.clamp(self.config.pd_floor, self.config.pd_ceiling)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Calibration summary for the stats API
    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "score_ref": self.config.score_ref,
            "pdo": self.config.pdo,
            "odds": self.config.odds,
            "offset": self.offset,
            "factor": self.factor,
            "pd_floor": self.config.pd_floor,
            "pd_ceiling": self.config.pd_ceiling,
        })
    }
}
