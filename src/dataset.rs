use std::io::{Read, Write};
use std::path::Path;

use crate::risk::RiskCategory;

/// In-memory table parsed from one CSV upload or input file
///
/// Cells are kept as raw strings so the scored output reproduces the input
/// verbatim; numeric views are parsed on demand. One frame lives for one
/// rendering/scoring pass, nothing persists.
#[derive(Debug, Clone)]
pub struct Frame {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| anyhow::anyhow!("Failed to read CSV header: {}", e))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(anyhow::anyhow!("CSV has no header row"));
        }

        let mut rows = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| anyhow::anyhow!("CSV row {}: {}", i + 1, e))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open CSV '{}': {}", path.display(), e))?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_str(data: &str) -> anyhow::Result<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Parse one column as f64, naming the offending cell on failure
    pub fn numeric_column(&self, col: usize) -> anyhow::Result<Vec<f64>> {
        let name = &self.headers[col];
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row[col].parse::<f64>().map_err(|_| {
                    anyhow::anyhow!(
                        "Column '{}' row {}: '{}' is not numeric",
                        name,
                        i + 1,
                        row[col]
                    )
                })
            })
            .collect()
    }

    /// Whether every cell of a column parses as a number
    pub fn is_numeric_column(&self, col: usize) -> bool {
        self.rows.iter().all(|row| row[col].parse::<f64>().is_ok())
    }

    /// Customer identifiers for display: the kit's CustomerID column when
    /// present, otherwise the first non-numeric column, otherwise row numbers.
    pub fn display_ids(&self) -> Vec<String> {
        let id_col = self
            .column_index("CustomerID")
            .or_else(|| (0..self.headers.len()).find(|&c| !self.is_numeric_column(c)));

        match id_col {
            Some(col) => self.rows.iter().map(|row| row[col].clone()).collect(),
            None => (1..=self.rows.len()).map(|i| format!("row_{}", i)).collect(),
        }
    }
}

/// A frame plus its three derived columns
#[derive(Debug, Clone)]
pub struct ScoredFrame {
    pub frame: Frame,
    pub ids: Vec<String>,
    pub pd: Vec<f64>,
    pub scores: Vec<f64>,
    pub categories: Vec<RiskCategory>,
    /// Where the rows came from ("upload:...", "batch:...", "sample")
    pub source: String,
}

impl ScoredFrame {
    /// Write the input table augmented with PD, Behavior_Score and
    /// Risk_Category. Derived columns already present in the input are not
    /// appended a second time.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let has = |name: &str| self.frame.column_index(name).is_some();
        let mut headers: Vec<String> = self.frame.headers().to_vec();
        if !has("PD") {
            headers.push("PD".to_string());
        }
        if !has("Behavior_Score") {
            headers.push("Behavior_Score".to_string());
        }
        if !has("Risk_Category") {
            headers.push("Risk_Category".to_string());
        }
        csv_writer.write_record(&headers)?;

        for i in 0..self.frame.len() {
            let mut record: Vec<String> = (0..self.frame.headers().len())
                .map(|c| self.frame.cell(i, c).to_string())
                .collect();
            if !has("PD") {
                record.push(format!("{}", self.pd[i]));
            }
            if !has("Behavior_Score") {
                record.push(format!("{:.2}", self.scores[i]));
            }
            if !has("Risk_Category") {
                record.push(self.categories[i].label().to_string());
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| anyhow::anyhow!("Scored CSV is not UTF-8: {}", e))
    }
}
