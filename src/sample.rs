use std::io::Write;

use rand::Rng;

/// Synthetic rows in the sample kit schema
///
/// CustomerID,feature_1,feature_2,feature_3,feature_4
/// CUST_001,0.12,45000,0.30,1
///
/// feature_1: delinquency rate, feature_2: income, feature_3: utilization,
/// feature_4: small ordinal class. Shapes match the shipped sample file so a
/// generated CSV drops straight into the batch scorer or the dashboard.
pub fn write_sample_csv<W: Write, R: Rng>(writer: &mut W, rows: usize, rng: &mut R) -> anyhow::Result<()> {
    writeln!(writer, "CustomerID,feature_1,feature_2,feature_3,feature_4")?;
    for i in 1..=rows {
        let rate: f64 = rng.gen_range(0.0..0.25);
        let income: f64 = rng.gen_range(25_000.0..110_000.0);
        let utilization: f64 = rng.gen_range(0.0..0.60);
        let class: u8 = rng.gen_range(0..=2);
        writeln!(
            writer,
            "CUST_{:03},{:.2},{:.0},{:.2},{}",
            i, rate, income, utilization, class
        )?;
    }
    Ok(())
}

/// Sample CSV as a string (tests, demo upload)
pub fn sample_csv<R: Rng>(rows: usize, rng: &mut R) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_sample_csv(&mut buf, rows, rng)?;
    String::from_utf8(buf).map_err(|e| anyhow::anyhow!("Sample CSV is not UTF-8: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Frame;
    use rand::SeedableRng;

    #[test]
    fn test_sample_parses_as_frame() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let csv = sample_csv(50, &mut rng).unwrap();
        let frame = Frame::from_csv_str(&csv).unwrap();
        assert_eq!(frame.len(), 50);
        assert_eq!(
            frame.headers(),
            &["CustomerID", "feature_1", "feature_2", "feature_3", "feature_4"]
        );
        assert_eq!(frame.display_ids()[0], "CUST_001");
    }

    #[test]
    fn test_sample_features_are_numeric_and_in_shape() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let csv = sample_csv(100, &mut rng).unwrap();
        let frame = Frame::from_csv_str(&csv).unwrap();
        let rates = frame.numeric_column(1).unwrap();
        assert!(rates.iter().all(|r| (0.0..=0.25).contains(r)));
        let incomes = frame.numeric_column(2).unwrap();
        assert!(incomes.iter().all(|v| (25_000.0..=110_000.0).contains(v)));
        let classes = frame.numeric_column(4).unwrap();
        assert!(classes.iter().all(|c| [0.0, 1.0, 2.0].contains(c)));
    }
}
