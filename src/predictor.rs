use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Frame;

/// Per-feature summary driving the dashboard's what-if form
///
/// Numeric columns get a range input (min/max, mean as the default value),
/// everything else a select over the values seen in the upload.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Summarize every column of the frame except the PD column itself
pub fn feature_schema(frame: &Frame) -> Vec<FeatureSummary> {
    frame
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != "PD")
        .map(|(col, name)| {
            if !frame.is_empty() && frame.is_numeric_column(col) {
                // Parse cannot fail here, the column was just checked
                let values = frame.numeric_column(col).unwrap_or_default();
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                FeatureSummary {
                    name: name.clone(),
                    kind: FeatureKind::Numeric,
                    min: Some(min),
                    max: Some(max),
                    mean: Some(mean),
                    options: Vec::new(),
                }
            } else {
                let mut seen = Vec::new();
                for i in 0..frame.len() {
                    let cell = frame.cell(i, col);
                    if !seen.iter().any(|s: &String| s == cell) {
                        seen.push(cell.to_string());
                    }
                }
                FeatureSummary {
                    name: name.clone(),
                    kind: FeatureKind::Categorical,
                    min: None,
                    max: None,
                    mean: None,
                    options: seen,
                }
            }
        })
        .collect()
}

/// Fallback what-if PD when no classifier is loaded: the frame's mean PD
/// nudged by how far each numeric input sits from its column mean.
pub fn heuristic_pd(frame: &Frame, inputs: &BTreeMap<String, serde_json::Value>) -> anyhow::Result<f64> {
    let pd_col = frame
        .column_index("PD")
        .ok_or_else(|| anyhow::anyhow!("Current dataset has no 'PD' column"))?;
    let pd_values = frame.numeric_column(pd_col)?;
    if pd_values.is_empty() {
        return Err(anyhow::anyhow!("Current dataset is empty"));
    }

    let mut pd = pd_values.iter().sum::<f64>() / pd_values.len() as f64;

    for summary in feature_schema(frame) {
        if summary.kind != FeatureKind::Numeric {
            continue;
        }
        let (Some(mean), Some(value)) = (
            summary.mean,
            inputs.get(&summary.name).and_then(|v| v.as_f64()),
        ) else {
            continue;
        };
        pd += (value - mean) * 0.0001;
    }

    Ok(pd)
}
