use serde::Serialize;

use crate::dataset::ScoredFrame;
use crate::risk::RiskCategory;

/// KPI card values for the dashboard header
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub customers: usize,
    pub avg_pd: f64,
    pub avg_score: f64,
    pub high_risk: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: RiskCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

/// One scored row as the chart/table APIs expose it
#[derive(Debug, Clone, Serialize)]
pub struct RecordOut {
    pub id: String,
    pub pd: f64,
    pub score: f64,
    pub category: RiskCategory,
}

pub fn kpis(scored: &ScoredFrame) -> Kpis {
    let n = scored.pd.len();
    let (avg_pd, avg_score) = if n == 0 {
        (0.0, 0.0)
    } else {
        (
            scored.pd.iter().sum::<f64>() / n as f64,
            scored.scores.iter().sum::<f64>() / n as f64,
        )
    };
    Kpis {
        customers: n,
        avg_pd,
        avg_score,
        high_risk: scored
            .categories
            .iter()
            .filter(|c| **c == RiskCategory::High)
            .count(),
    }
}

/// Equal-width bins over the observed range, last bin inclusive
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    // Degenerate range: everything in one bin
    if hi <= lo {
        return vec![HistogramBin {
            lo,
            hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lo: lo + width * i as f64,
            hi: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Count per risk tier, zeros included so the donut always has three slices
pub fn category_counts(scored: &ScoredFrame) -> Vec<CategoryCount> {
    RiskCategory::ALL
        .iter()
        .map(|cat| CategoryCount {
            category: *cat,
            label: cat.label(),
            color: cat.color(),
            count: scored.categories.iter().filter(|c| *c == cat).count(),
        })
        .collect()
}

/// Scored rows, optionally filtered by tier, capped at `limit`
pub fn records(scored: &ScoredFrame, limit: usize, category: Option<RiskCategory>) -> Vec<RecordOut> {
    (0..scored.pd.len())
        .filter(|&i| category.map_or(true, |c| scored.categories[i] == c))
        .take(limit)
        .map(|i| RecordOut {
            id: scored.ids[i].clone(),
            pd: scored.pd[i],
            score: scored.scores[i],
            category: scored.categories[i],
        })
        .collect()
}

/// Riskiest customers first: sorted by PD descending
pub fn top_high_risk(scored: &ScoredFrame, limit: usize) -> Vec<RecordOut> {
    let mut indices: Vec<usize> = (0..scored.pd.len()).collect();
    indices.sort_by(|&a, &b| {
        scored.pd[b]
            .partial_cmp(&scored.pd[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
        .into_iter()
        .take(limit)
        .map(|i| RecordOut {
            id: scored.ids[i].clone(),
            pd: scored.pd[i],
            score: scored.scores[i],
            category: scored.categories[i],
        })
        .collect()
}
