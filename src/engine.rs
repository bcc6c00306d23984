use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::dataset::{Frame, ScoredFrame};
use crate::journal::Journal;
use crate::metrics::MetricsCounters;
use crate::model::ModelBundle;
use crate::predictor;
use crate::risk::{RiskBands, RiskCategory};
use crate::scorecard::ScorecardScale;

/// Core scoring engine - one scoring pass per upload/batch, no state across
/// passes beyond the currently displayed frame
pub struct ScoringEngine {
    pub config: Arc<Config>,
    pub scale: ScorecardScale,
    pub bands: RiskBands,
    pub model: Option<ModelBundle>,
    pub journal: Arc<Journal>,
    pub metrics: MetricsCounters,
    current: RwLock<Option<Arc<ScoredFrame>>>,
}

/// What-if prediction result
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub pd: f64,
    pub score: f64,
    pub category: RiskCategory,
    /// "model" or "heuristic"
    pub source: &'static str,
}

impl ScoringEngine {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let scale = ScorecardScale::new(&config.scorecard);
        let bands = RiskBands::new(&config.risk);
        // A configured-but-missing model file aborts startup here
        let model = ModelBundle::load(&config.model)?;
        let journal = Arc::new(Journal::new(&config.journal));

        match model {
            Some(_) => info!("📊 Scoring mode: model inference"),
            None => info!("📊 Scoring mode: PD column passthrough"),
        }

        Ok(Self {
            config,
            scale,
            bands,
            model,
            journal,
            metrics: MetricsCounters::new(),
            current: RwLock::new(None),
        })
    }

    /// Run one scoring pass over a parsed frame
    ///
    /// A frame carrying a PD column is scored from it directly; otherwise a
    /// loaded model computes PD from the feature columns. Neither available
    /// is the uploaded-the-wrong-file case and reports exactly that.
    pub fn score_frame(&self, frame: Frame, source: &str) -> anyhow::Result<ScoredFrame> {
        let start = std::time::Instant::now();

        let pd = match frame.column_index("PD") {
            Some(col) => frame.numeric_column(col)?,
            None => match self.model {
                Some(ref model) => self.predict_column(&frame, model)?,
                None => {
                    return Err(anyhow::anyhow!("CSV must contain a 'PD' column"));
                }
            },
        };

        let scores: Vec<f64> = pd.iter().map(|&p| self.scale.score(p)).collect();
        let categories: Vec<RiskCategory> =
            scores.iter().map(|&s| self.bands.categorize(s)).collect();

        let scored = ScoredFrame {
            ids: frame.display_ids(),
            pd,
            scores,
            categories,
            frame,
            source: source.to_string(),
        };

        let kpis = crate::analytics::kpis(&scored);
        self.journal.record_run(
            source,
            kpis.customers,
            kpis.avg_pd,
            kpis.avg_score,
            kpis.high_risk,
            start.elapsed(),
        );
        self.metrics.scoring_runs.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .rows_scored
            .fetch_add(scored.pd.len() as u64, Ordering::Relaxed);

        info!(
            "{} -> {} rows scored (avg PD {:.3}, avg score {:.1}, high risk {})",
            source, kpis.customers, kpis.avg_pd, kpis.avg_score, kpis.high_risk
        );

        Ok(scored)
    }

    /// PD column via the model: align features by header name when the
    /// upload names them all, positionally (identifier column first) when not
    fn predict_column(&self, frame: &Frame, model: &ModelBundle) -> anyhow::Result<Vec<f64>> {
        let by_name: Option<Vec<usize>> = model
            .classifier
            .feature_names
            .iter()
            .map(|n| frame.column_index(n))
            .collect();

        let feature_cols: Vec<usize> = match by_name {
            Some(cols) => {
                debug!("Feature columns aligned by name");
                cols
            }
            None => {
                debug!("Feature headers incomplete, falling back to positional order");
                (1..frame.headers().len()).collect()
            }
        };

        if feature_cols.len() != model.classifier.num_features() {
            return Err(anyhow::anyhow!(
                "Model expects {} feature columns, input has {} (after the identifier column)",
                model.classifier.num_features(),
                feature_cols.len()
            ));
        }

        let columns: Vec<Vec<f64>> = feature_cols
            .iter()
            .map(|&c| frame.numeric_column(c))
            .collect::<anyhow::Result<_>>()?;

        let mut pd = Vec::with_capacity(frame.len());
        let mut features = vec![0.0; columns.len()];
        for row in 0..frame.len() {
            for (j, col) in columns.iter().enumerate() {
                features[j] = col[row];
            }
            pd.push(model.predict_pd(&features)?);
        }
        Ok(pd)
    }

    /// Score an upload and make it the dashboard's current frame
    pub fn ingest(&self, frame: Frame, source: &str) -> anyhow::Result<Arc<ScoredFrame>> {
        match self.score_frame(frame, source) {
            Ok(scored) => {
                let scored = Arc::new(scored);
                *self.current.write() = Some(scored.clone());
                self.metrics.uploads.fetch_add(1, Ordering::Relaxed);
                Ok(scored)
            }
            Err(e) => {
                self.metrics.upload_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// The currently displayed frame, if any upload succeeded yet
    pub fn current(&self) -> Option<Arc<ScoredFrame>> {
        self.current.read().clone()
    }

    /// What-if prediction for a single hypothetical customer
    pub fn predict(&self, inputs: &BTreeMap<String, serde_json::Value>) -> anyhow::Result<Prediction> {
        let (raw_pd, source) = match self.model {
            Some(ref model) => (self.predict_from_inputs(model, inputs)?, "model"),
            None => {
                let current = self
                    .current()
                    .ok_or_else(|| anyhow::anyhow!("No dataset uploaded and no model loaded"))?;
                (predictor::heuristic_pd(&current.frame, inputs)?, "heuristic")
            }
        };

        let pd = self.scale.clamp_pd(raw_pd);
        let score = self.scale.score(pd);
        let category = self.bands.categorize(score);
        self.metrics.predictions.fetch_add(1, Ordering::Relaxed);
        debug!("What-if ({}) -> pd {:.4}, score {:.1}, {}", source, pd, score, category);

        Ok(Prediction {
            pd,
            score,
            category,
            source,
        })
    }

    fn predict_from_inputs(
        &self,
        model: &ModelBundle,
        inputs: &BTreeMap<String, serde_json::Value>,
    ) -> anyhow::Result<f64> {
        let features: Vec<f64> = model
            .classifier
            .feature_names
            .iter()
            .map(|name| {
                inputs
                    .get(name)
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| anyhow::anyhow!("Missing numeric value for feature '{}'", name))
            })
            .collect::<anyhow::Result<_>>()?;
        model.predict_pd(&features)
    }

    /// Get stats for Web UI
    pub fn get_stats(&self) -> serde_json::Value {
        let dataset = match self.current() {
            Some(scored) => {
                let kpis = crate::analytics::kpis(&scored);
                serde_json::json!({
                    "loaded": true,
                    "source": scored.source,
                    "rows": kpis.customers,
                    "avg_pd": kpis.avg_pd,
                    "avg_score": kpis.avg_score,
                    "high_risk": kpis.high_risk,
                })
            }
            None => serde_json::json!({ "loaded": false }),
        };

        serde_json::json!({
            "mode": if self.model.is_some() { "model" } else { "pd-column" },
            "scorecard": self.scale.get_stats(),
            "risk_bands": self.bands.get_stats(),
            "model": self.model.as_ref().map(|m| m.get_stats()),
            "dataset": dataset,
            "journal": self.journal.get_stats(),
            "counters": {
                "scoring_runs": self.metrics.scoring_runs.load(Ordering::Relaxed),
                "rows_scored": self.metrics.rows_scored.load(Ordering::Relaxed),
                "uploads": self.metrics.uploads.load(Ordering::Relaxed),
                "upload_failures": self.metrics.upload_failures.load(Ordering::Relaxed),
                "predictions": self.metrics.predictions.load(Ordering::Relaxed),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassifierArtifact, ScalerArtifact};

    fn pd_engine() -> ScoringEngine {
        let config: Config = toml::from_str("").unwrap();
        ScoringEngine::new(Arc::new(config)).unwrap()
    }

    fn model_engine() -> ScoringEngine {
        let mut engine = pd_engine();
        engine.model = Some(ModelBundle {
            classifier: ClassifierArtifact {
                feature_names: vec!["feature_1".into(), "feature_2".into()],
                coefficients: vec![1.0, -0.5],
                intercept: 0.0,
            },
            scaler: None,
        });
        engine
    }

    #[test]
    fn test_pd_column_scoring_end_to_end() {
        let engine = pd_engine();
        let frame = Frame::from_csv_str("CustomerID,PD\nCUST_001,0.5\n").unwrap();
        let scored = engine.score_frame(frame, "upload:t.csv").unwrap();
        // PD 0.5 is even odds: score equals the offset, Medium with 600/700
        assert!((scored.scores[0] - 686.4385618977473).abs() < 1e-9);
        assert_eq!(scored.categories[0], RiskCategory::Medium);
    }

    #[test]
    fn test_missing_pd_without_model_reports_column() {
        let engine = pd_engine();
        let frame = Frame::from_csv_str("CustomerID,feature_1\nCUST_001,0.5\n").unwrap();
        let err = engine.score_frame(frame, "upload:t.csv").unwrap_err();
        assert!(err.to_string().contains("'PD' column"));
    }

    #[test]
    fn test_model_scoring_aligns_by_name() {
        let engine = model_engine();
        // Columns deliberately reversed relative to training order
        let frame =
            Frame::from_csv_str("CustomerID,feature_2,feature_1\nCUST_001,2.0,1.0\n").unwrap();
        let scored = engine.score_frame(frame, "batch:t.csv").unwrap();
        // z = 1*1.0 - 0.5*2.0 = 0 -> pd 0.5 -> offset score
        assert!((scored.pd[0] - 0.5).abs() < 1e-12);
        assert!((scored.scores[0] - 686.4385618977473).abs() < 1e-9);
    }

    #[test]
    fn test_model_scoring_positional_fallback() {
        let engine = model_engine();
        let frame = Frame::from_csv_str("CustomerID,f_a,f_b\nCUST_001,1.0,2.0\n").unwrap();
        let scored = engine.score_frame(frame, "batch:t.csv").unwrap();
        assert!((scored.pd[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_model_width_mismatch_rejected() {
        let engine = model_engine();
        let frame = Frame::from_csv_str("CustomerID,f_a\nCUST_001,1.0\n").unwrap();
        let err = engine.score_frame(frame, "batch:t.csv").unwrap_err();
        assert!(err.to_string().contains("feature columns"));
    }

    #[test]
    fn test_ingest_sets_current_frame() {
        let engine = pd_engine();
        assert!(engine.current().is_none());
        let frame = Frame::from_csv_str("CustomerID,PD\nCUST_001,0.5\n").unwrap();
        engine.ingest(frame, "upload:t.csv").unwrap();
        assert_eq!(engine.current().unwrap().pd, vec![0.5]);
    }

    #[test]
    fn test_failed_ingest_keeps_previous_frame() {
        let engine = pd_engine();
        let good = Frame::from_csv_str("CustomerID,PD\nCUST_001,0.5\n").unwrap();
        engine.ingest(good, "upload:good.csv").unwrap();
        let bad = Frame::from_csv_str("CustomerID,other\nCUST_001,1\n").unwrap();
        assert!(engine.ingest(bad, "upload:bad.csv").is_err());
        assert_eq!(engine.current().unwrap().source, "upload:good.csv");
        assert_eq!(
            engine.metrics.upload_failures.load(Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_predict_with_model() {
        let engine = model_engine();
        let mut inputs = BTreeMap::new();
        inputs.insert("feature_1".to_string(), serde_json::json!(1.0));
        inputs.insert("feature_2".to_string(), serde_json::json!(2.0));
        let p = engine.predict(&inputs).unwrap();
        assert!((p.pd - 0.5).abs() < 1e-12);
        assert_eq!(p.source, "model");
        assert_eq!(p.category, RiskCategory::Medium);
    }

    #[test]
    fn test_predict_with_model_missing_feature() {
        let engine = model_engine();
        let inputs = BTreeMap::new();
        let err = engine.predict(&inputs).unwrap_err();
        assert!(err.to_string().contains("feature_1"));
    }

    #[test]
    fn test_predict_heuristic_clamps_to_scorecard_interval() {
        let engine = pd_engine();
        let frame =
            Frame::from_csv_str("CustomerID,PD,income\nCUST_001,0.99,50000\nCUST_002,0.99,50000\n")
                .unwrap();
        engine.ingest(frame, "upload:t.csv").unwrap();
        let mut inputs = BTreeMap::new();
        // Push the heuristic far past 1.0; the scorecard clamp must cap it
        inputs.insert("income".to_string(), serde_json::json!(1_000_000.0));
        let p = engine.predict(&inputs).unwrap();
        assert_eq!(p.pd, 0.999);
        assert_eq!(p.source, "heuristic");
        assert_eq!(p.category, RiskCategory::High);
    }

    #[test]
    fn test_predict_without_model_or_dataset() {
        let engine = pd_engine();
        assert!(engine.predict(&BTreeMap::new()).is_err());
    }

    #[test]
    fn test_scaled_model_inference() {
        let mut engine = pd_engine();
        engine.model = Some(ModelBundle {
            classifier: ClassifierArtifact {
                feature_names: vec!["feature_1".into()],
                coefficients: vec![1.0],
                intercept: 0.0,
            },
            scaler: Some(ScalerArtifact {
                mean: vec![10.0],
                std: vec![2.0],
            }),
        });
        let frame = Frame::from_csv_str("CustomerID,feature_1\nCUST_001,10.0\n").unwrap();
        let scored = engine.score_frame(frame, "batch:t.csv").unwrap();
        // (10 - 10) / 2 = 0 -> sigmoid(0) = 0.5
        assert!((scored.pd[0] - 0.5).abs() < 1e-12);
    }
}
