//! Synthetic sample-data generator.
//!
//! Emits rows in the sample kit schema (CustomerID,feature_1..feature_4) for
//! demos and for exercising the batch scorer without real portfolio data.

use behavior_scorecard::sample;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(rows) = args.next() else {
        eprintln!("Usage: gen-sample <rows> [output.csv]");
        std::process::exit(2);
    };
    let rows: usize = rows
        .parse()
        .map_err(|_| anyhow::anyhow!("Row count must be a number, got '{}'", rows))?;
    let output_path = args.next();

    let mut rng = rand::thread_rng();
    match output_path {
        Some(path) => {
            let mut file = std::fs::File::create(&path)
                .map_err(|e| anyhow::anyhow!("Failed to create '{}': {}", path, e))?;
            sample::write_sample_csv(&mut file, rows, &mut rng)?;
            eprintln!("Wrote {} sample rows to {}", rows, path);
        }
        None => {
            sample::write_sample_csv(&mut std::io::stdout().lock(), rows, &mut rng)?;
        }
    }

    Ok(())
}
