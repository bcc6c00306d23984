use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Serialized logistic classifier
///
/// The artifact is the JSON export of the trained model: one coefficient per
/// feature plus an intercept. `predict_proba` returns the positive-class
/// probability (the PD).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    /// Feature names in training order
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Optional standardizing scaler exported alongside the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ClassifierArtifact {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read model file '{}': {}", path.display(), e))?;
        let artifact: ClassifierArtifact = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse model '{}': {}", path.display(), e))?;
        artifact.check()?;
        Ok(artifact)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.feature_names.is_empty() {
            return Err(anyhow::anyhow!("Model has no features"));
        }
        if self.feature_names.len() != self.coefficients.len() {
            return Err(anyhow::anyhow!(
                "Model has {} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            ));
        }
        Ok(())
    }

    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Positive-class probability for one feature vector
    pub fn predict_proba(&self, features: &[f64]) -> anyhow::Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(anyhow::anyhow!(
                "Expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            ));
        }
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        Ok(sigmoid(z))
    }
}

impl ScalerArtifact {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read scaler file '{}': {}", path.display(), e))?;
        let artifact: ScalerArtifact = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scaler '{}': {}", path.display(), e))?;
        if artifact.mean.len() != artifact.std.len() {
            return Err(anyhow::anyhow!(
                "Scaler has {} means but {} stds",
                artifact.mean.len(),
                artifact.std.len()
            ));
        }
        Ok(artifact)
    }

    /// Standardize one feature vector in place
    pub fn transform(&self, features: &mut [f64]) -> anyhow::Result<()> {
        if features.len() != self.mean.len() {
            return Err(anyhow::anyhow!(
                "Scaler expects {} features, got {}",
                self.mean.len(),
                features.len()
            ));
        }
        for (i, x) in features.iter_mut().enumerate() {
            // A degenerate column (std 0) passes through unscaled
            if self.std[i] != 0.0 {
                *x = (*x - self.mean[i]) / self.std[i];
            }
        }
        Ok(())
    }
}

/// Model plus optional scaler, resolved from config paths at startup
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub classifier: ClassifierArtifact,
    pub scaler: Option<ScalerArtifact>,
}

impl ModelBundle {
    /// Load the configured artifacts. A configured model path that does not
    /// exist is fatal; a configured scaler path that does not exist is not.
    pub fn load(config: &crate::config::ModelConfig) -> anyhow::Result<Option<Self>> {
        let Some(ref model_file) = config.model_file else {
            return Ok(None);
        };

        let model_path = Path::new(model_file);
        if !model_path.exists() {
            return Err(anyhow::anyhow!("Model file not found: {}", model_file));
        }
        let classifier = ClassifierArtifact::load(model_path)?;
        info!(
            "Model loaded from {} ({} features)",
            model_file,
            classifier.num_features()
        );

        let scaler = match config.scaler_file {
            Some(ref scaler_file) if Path::new(scaler_file).exists() => {
                let scaler = ScalerArtifact::load(Path::new(scaler_file))?;
                if scaler.mean.len() != classifier.num_features() {
                    return Err(anyhow::anyhow!(
                        "Scaler width {} does not match model width {}",
                        scaler.mean.len(),
                        classifier.num_features()
                    ));
                }
                info!("Scaler loaded from {}", scaler_file);
                Some(scaler)
            }
            Some(ref scaler_file) => {
                info!("Scaler file {} not present, scoring unscaled", scaler_file);
                None
            }
            None => None,
        };

        Ok(Some(Self { classifier, scaler }))
    }

    /// Scale (if a scaler is present) and predict the PD for one row
    pub fn predict_pd(&self, features: &[f64]) -> anyhow::Result<f64> {
        match self.scaler {
            Some(ref scaler) => {
                let mut scaled = features.to_vec();
                scaler.transform(&mut scaled)?;
                self.classifier.predict_proba(&scaled)
            }
            None => self.classifier.predict_proba(features),
        }
    }

    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "features": self.classifier.feature_names,
            "num_features": self.classifier.num_features(),
            "scaled": self.scaler.is_some(),
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
