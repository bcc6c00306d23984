use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub scorecard: ScorecardConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModelConfig {
    /// Serialized classifier artifact. If set and the file does not exist,
    /// startup aborts before any scoring.
    pub model_file: Option<String>,
    /// Optional feature scaler applied before inference.
    pub scaler_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScorecardConfig {
    /// Score assigned at the reference odds
    #[serde(default = "default_score_ref")]
    pub score_ref: f64,
    /// Points to double the odds
    #[serde(default = "default_pdo")]
    pub pdo: f64,
    /// Reference odds at score_ref
    #[serde(default = "default_odds")]
    pub odds: f64,
    /// PD is clamped to [pd_floor, pd_ceiling] before the log-odds transform
    #[serde(default = "default_pd_floor")]
    pub pd_floor: f64,
    #[serde(default = "default_pd_ceiling")]
    pub pd_ceiling: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    /// Scores at or above this are Low risk
    #[serde(default = "default_low_floor")]
    pub low_floor: f64,
    /// Scores at or above this (but below low_floor) are Medium risk
    #[serde(default = "default_medium_floor")]
    pub medium_floor: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Max journal entries before rotation
    #[serde(default = "default_journal_max")]
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            score_ref: default_score_ref(),
            pdo: default_pdo(),
            odds: default_odds(),
            pd_floor: default_pd_floor(),
            pd_ceiling: default_pd_ceiling(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_floor: default_low_floor(),
            medium_floor: default_medium_floor(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_journal_max(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_web_address(),
            port: default_web_port(),
        }
    }
}

// Default value functions
fn default_score_ref() -> f64 { 600.0 }
fn default_pdo() -> f64 { 20.0 }
fn default_odds() -> f64 { 20.0 }
fn default_pd_floor() -> f64 { 0.001 }
fn default_pd_ceiling() -> f64 { 0.999 }
fn default_low_floor() -> f64 { 700.0 }
fn default_medium_floor() -> f64 { 600.0 }
fn default_true() -> bool { true }
fn default_journal_max() -> usize { 10_000 }
fn default_web_address() -> String { "0.0.0.0".to_string() }
fn default_web_port() -> u16 { 8088 }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject constant sets that would break the transform or the buckets
    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.scorecard;
        if s.pdo <= 0.0 {
            return Err(anyhow::anyhow!("scorecard.pdo must be positive, got {}", s.pdo));
        }
        if s.odds <= 0.0 {
            return Err(anyhow::anyhow!("scorecard.odds must be positive, got {}", s.odds));
        }
        if !(s.pd_floor > 0.0 && s.pd_ceiling < 1.0 && s.pd_floor < s.pd_ceiling) {
            return Err(anyhow::anyhow!(
                "scorecard PD clamp must satisfy 0 < pd_floor < pd_ceiling < 1, got [{}, {}]",
                s.pd_floor, s.pd_ceiling
            ));
        }
        if self.risk.medium_floor >= self.risk.low_floor {
            return Err(anyhow::anyhow!(
                "risk.medium_floor ({}) must be below risk.low_floor ({})",
                self.risk.medium_floor, self.risk.low_floor
            ));
        }
        Ok(())
    }
}
