//! Batch scorer for BI scripting connectors.
//!
//! Reads a feature CSV, scores every row through the configured model and
//! the scorecard transform, and writes the input table augmented with PD,
//! Behavior_Score and Risk_Category. Without an output path the scored CSV
//! goes to stdout so a connector can capture it directly.

use std::path::Path;
use std::sync::Arc;

use behavior_scorecard::config::Config;
use behavior_scorecard::dataset::Frame;
use behavior_scorecard::engine::ScoringEngine;

fn main() -> anyhow::Result<()> {
    // Logs to stderr; stdout is reserved for the scored CSV
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "behavior_scorecard=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(input_path)) = (args.next(), args.next()) else {
        eprintln!("Usage: score-batch <config.toml> <input.csv> [output.csv]");
        std::process::exit(2);
    };
    let output_path = args.next();

    let config = Config::load(&config_path)?;
    if config.model.model_file.is_none() {
        return Err(anyhow::anyhow!(
            "score-batch requires [model] model_file in {}",
            config_path
        ));
    }

    let engine = ScoringEngine::new(Arc::new(config))?;
    let frame = Frame::from_csv_path(Path::new(&input_path))?;
    let scored = engine.score_frame(frame, &format!("batch:{}", input_path))?;

    match output_path {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .map_err(|e| anyhow::anyhow!("Failed to create '{}': {}", path, e))?;
            scored.write_csv(file)?;
        }
        None => {
            scored.write_csv(std::io::stdout().lock())?;
        }
    }

    Ok(())
}
