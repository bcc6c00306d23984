use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::JournalConfig;

/// Scoring-run journal - every batch/upload/sample pass is recorded
///
/// "What did the portfolio look like on the upload before this one?"
/// Entries are ephemeral and rotation-bounded, nothing is persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub source: String,
    pub rows: usize,
    pub mean_pd: f64,
    pub mean_score: f64,
    pub high_risk: usize,
    pub latency_us: u64,
}

pub struct Journal {
    config: JournalConfig,
    entries: RwLock<Vec<JournalEntry>>,
    total_recorded: AtomicU64,
}

impl Journal {
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            config: config.clone(),
            entries: RwLock::new(Vec::new()),
            total_recorded: AtomicU64::new(0),
        }
    }

    /// Record a completed scoring run
    pub fn record_run(
        &self,
        source: &str,
        rows: usize,
        mean_pd: f64,
        mean_score: f64,
        high_risk: usize,
        latency: Duration,
    ) {
        if !self.config.enabled {
            return;
        }

        let entry = JournalEntry {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            source: source.to_string(),
            rows,
            mean_pd,
            mean_score,
            high_risk,
            latency_us: latency.as_micros() as u64,
        };

        let mut entries = self.entries.write();
        entries.push(entry);
        self.total_recorded.fetch_add(1, Ordering::Relaxed);

        // Rotation: keep within max_entries
        if entries.len() > self.config.max_entries {
            let drain_count = entries.len() - self.config.max_entries;
            entries.drain(..drain_count);
        }
    }

    /// Search runs by source substring, most recent first
    pub fn search(&self, source: Option<&str>, limit: usize) -> Vec<JournalEntry> {
        let entries = self.entries.read();
        entries
            .iter()
            .rev()
            .filter(|e| source.map_or(true, |s| e.source.contains(s)))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Get recent entries for Web UI
    pub fn recent(&self, count: usize) -> Vec<JournalEntry> {
        let entries = self.entries.read();
        entries.iter().rev().take(count).cloned().collect()
    }

    /// Get journal stats
    pub fn get_stats(&self) -> serde_json::Value {
        let entries = self.entries.read();
        serde_json::json!({
            "enabled": self.config.enabled,
            "current_entries": entries.len(),
            "max_entries": self.config.max_entries,
            "total_recorded": self.total_recorded.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_journal(max_entries: usize) -> Journal {
        Journal::new(&JournalConfig {
            enabled: true,
            max_entries,
        })
    }

    #[test]
    fn test_record_and_recent() {
        let journal = test_journal(100);
        journal.record_run("upload:test.csv", 5, 0.2, 710.0, 1, Duration::from_millis(3));
        journal.record_run("sample", 500, 0.15, 725.0, 12, Duration::from_millis(8));

        let recent = journal.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].source, "sample");
        assert_eq!(recent[1].rows, 5);
    }

    #[test]
    fn test_rotation_keeps_newest() {
        let journal = test_journal(3);
        for i in 0..10 {
            journal.record_run(&format!("upload:{}.csv", i), i, 0.1, 700.0, 0, Duration::ZERO);
        }
        let recent = journal.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].source, "upload:9.csv");
    }

    #[test]
    fn test_search_by_source() {
        let journal = test_journal(100);
        journal.record_run("upload:a.csv", 1, 0.1, 700.0, 0, Duration::ZERO);
        journal.record_run("batch:b.csv", 1, 0.1, 700.0, 0, Duration::ZERO);
        let found = journal.search(Some("batch"), 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, "batch:b.csv");
    }

    #[test]
    fn test_disabled_records_nothing() {
        let journal = Journal::new(&JournalConfig {
            enabled: false,
            max_entries: 10,
        });
        journal.record_run("upload:x.csv", 1, 0.1, 700.0, 0, Duration::ZERO);
        assert!(journal.recent(10).is_empty());
    }
}
