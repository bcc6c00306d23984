use crate::risk::RiskCategory;

/// Banking visual theme consumed by the dashboard page (and importable by a
/// BI host). Pure styling, never read by scoring logic.
pub const THEME_NAME: &str = "Behavior Scorecard - Banking";
pub const DATA_COLORS: [&str; 5] = ["#28A745", "#F0AD4E", "#D73A49", "#3A4A5B", "#6C757D"];
pub const BACKGROUND: &str = "#FFFFFF";
pub const FOREGROUND: &str = "#222222";
pub const TABLE_ACCENT: &str = "#3A4A5B";

/// Theme document for GET /api/theme
pub fn theme_json() -> serde_json::Value {
    let mut risk_colors = serde_json::Map::new();
    for cat in RiskCategory::ALL {
        risk_colors.insert(cat.label().to_string(), cat.color().into());
    }
    serde_json::json!({
        "name": THEME_NAME,
        "dataColors": DATA_COLORS,
        "background": BACKGROUND,
        "foreground": FOREGROUND,
        "tableAccent": TABLE_ACCENT,
        "riskColors": risk_colors,
    })
}
