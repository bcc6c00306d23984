//! Prometheus-compatible metrics exporter for the scorecard service
//!
//! Endpoint: GET /metrics (on the web UI port, default 8088)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::ScoringEngine;
use crate::risk::RiskCategory;

/// Global counters atomically updated from scoring passes
pub struct MetricsCounters {
    /// Total scoring passes (uploads, batches, samples)
    pub scoring_runs: AtomicU64,
    /// Total rows scored across all passes
    pub rows_scored: AtomicU64,
    /// Successful dashboard uploads
    pub uploads: AtomicU64,
    /// Rejected dashboard uploads
    pub upload_failures: AtomicU64,
    /// What-if predictions served
    pub predictions: AtomicU64,
    /// Server start time
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            scoring_runs: AtomicU64::new(0),
            rows_scored: AtomicU64::new(0),
            uploads: AtomicU64::new(0),
            upload_failures: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl Default for MetricsCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(engine: &Arc<ScoringEngine>) -> String {
    let mut out = String::with_capacity(2048);
    let c = &engine.metrics;

    write_help_type(&mut out, "scorecard_up", "Whether the scorecard service is up.", "gauge");
    writeln!(out, "scorecard_up 1").ok();

    let uptime = c.start_time.elapsed().as_secs_f64();
    write_help_type(&mut out, "scorecard_time_up_seconds_total", "Uptime since service boot in seconds.", "counter");
    writeln!(out, "scorecard_time_up_seconds_total {:.3}", uptime).ok();

    write_help_type(&mut out, "scorecard_scoring_runs_total", "Total scoring passes performed.", "counter");
    writeln!(out, "scorecard_scoring_runs_total {}", c.scoring_runs.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "scorecard_rows_scored_total", "Total rows scored across all passes.", "counter");
    writeln!(out, "scorecard_rows_scored_total {}", c.rows_scored.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "scorecard_uploads_total", "Total successful dashboard uploads.", "counter");
    writeln!(out, "scorecard_uploads_total {}", c.uploads.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "scorecard_upload_failures_total", "Total rejected dashboard uploads.", "counter");
    writeln!(out, "scorecard_upload_failures_total {}", c.upload_failures.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "scorecard_predictions_total", "Total what-if predictions served.", "counter");
    writeln!(out, "scorecard_predictions_total {}", c.predictions.load(Ordering::Relaxed)).ok();

    // Current frame gauges
    write_help_type(&mut out, "scorecard_dataset_rows", "Rows in the currently displayed dataset.", "gauge");
    write_help_type(&mut out, "scorecard_dataset_avg_pd", "Mean PD of the current dataset.", "gauge");
    write_help_type(&mut out, "scorecard_dataset_avg_score", "Mean Behavior Score of the current dataset.", "gauge");
    write_help_type(&mut out, "scorecard_category_rows", "Rows per risk category in the current dataset.", "gauge");

    match engine.current() {
        Some(scored) => {
            let kpis = crate::analytics::kpis(&scored);
            writeln!(out, "scorecard_dataset_rows {}", kpis.customers).ok();
            writeln!(out, "scorecard_dataset_avg_pd {:.6}", kpis.avg_pd).ok();
            writeln!(out, "scorecard_dataset_avg_score {:.2}", kpis.avg_score).ok();
            for cat in RiskCategory::ALL {
                let count = scored.categories.iter().filter(|c| **c == cat).count();
                writeln!(out, "scorecard_category_rows{{category=\"{}\"}} {}", cat.label(), count).ok();
            }
        }
        None => {
            writeln!(out, "scorecard_dataset_rows 0").ok();
        }
    }

    // Journal
    let journal_stats = engine.journal.get_stats();
    let journal_entries = journal_stats["current_entries"].as_u64().unwrap_or(0);
    write_help_type(&mut out, "scorecard_journal_entries", "Scoring runs currently held in the journal.", "gauge");
    writeln!(out, "scorecard_journal_entries {}", journal_entries).ok();

    // Build info
    write_help_type(&mut out, "scorecard_build_info", "behavior-scorecard build information.", "gauge");
    writeln!(out, "scorecard_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dataset::Frame;

    #[test]
    fn test_render_includes_counters_and_gauges() {
        let config: Config = toml::from_str("").unwrap();
        let engine = Arc::new(ScoringEngine::new(Arc::new(config)).unwrap());
        let frame = Frame::from_csv_str("CustomerID,PD\nCUST_001,0.5\n").unwrap();
        engine.ingest(frame, "upload:t.csv").unwrap();

        let text = render_metrics(&engine);
        assert!(text.contains("scorecard_up 1"));
        assert!(text.contains("scorecard_scoring_runs_total 1"));
        assert!(text.contains("scorecard_rows_scored_total 1"));
        assert!(text.contains("scorecard_dataset_rows 1"));
        assert!(text.contains("scorecard_category_rows{category=\"Medium Risk\"} 1"));
        assert!(text.contains("# HELP scorecard_uploads_total"));
    }
}
