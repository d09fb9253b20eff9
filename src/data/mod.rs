// src/data/mod.rs — Tabular dataset loading and profiling

use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::infra::errors::ResearchError;

/// An in-memory CSV table. Opaque to the controller; only the execute
/// capability looks inside.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Summary of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnProfile {
    Numeric {
        name: String,
        min: f64,
        max: f64,
        mean: f64,
        missing: usize,
    },
    Text {
        name: String,
        distinct: usize,
        missing: usize,
    },
}

impl Dataset {
    pub fn load_csv(path: &Path) -> Result<Self, ResearchError> {
        let file = File::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let dataset = Self::from_reader(name, file)?;
        tracing::debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.headers.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader(name: impl Into<String>, reader: impl Read) -> Result<Self, ResearchError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self {
            name: name.into(),
            headers,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Profile every column. A column is numeric when every non-empty cell
    /// parses as a finite float and at least one cell is present.
    pub fn columns(&self) -> Vec<ColumnProfile> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| self.profile_column(idx, name))
            .collect()
    }

    fn profile_column(&self, idx: usize, name: &str) -> ColumnProfile {
        let cells: Vec<&str> = self
            .rows
            .iter()
            .map(|r| r.get(idx).map(|c| c.trim()).unwrap_or(""))
            .collect();
        let present: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
        let missing = cells.len() - present.len();

        let numbers: Option<Vec<f64>> = present
            .iter()
            .map(|c| c.parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        match numbers {
            Some(values) if !values.is_empty() => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                ColumnProfile::Numeric {
                    name: name.to_string(),
                    min,
                    max,
                    mean,
                    missing,
                }
            }
            _ => {
                let mut distinct = present.clone();
                distinct.sort_unstable();
                distinct.dedup();
                ColumnProfile::Text {
                    name: name.to_string(),
                    distinct: distinct.len(),
                    missing,
                }
            }
        }
    }

    /// Compact text description handed to the model: shape, per-column
    /// summary and the first `sample_rows` rows.
    pub fn profile(&self, sample_rows: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Dataset: {} ({} rows x {} columns)",
            self.name,
            self.row_count(),
            self.headers.len()
        );
        out.push_str("Columns:\n");
        for col in self.columns() {
            let _ = match col {
                ColumnProfile::Numeric {
                    name,
                    min,
                    max,
                    mean,
                    missing,
                } => writeln!(
                    out,
                    "- {name}: numeric, min={min:.2}, max={max:.2}, mean={mean:.2}, missing={missing}"
                ),
                ColumnProfile::Text {
                    name,
                    distinct,
                    missing,
                } => writeln!(out, "- {name}: text, distinct={distinct}, missing={missing}"),
            };
        }

        let n = sample_rows.min(self.rows.len());
        if n > 0 {
            let _ = writeln!(out, "Sample rows (first {n}):");
            let _ = writeln!(out, "{}", self.headers.join(","));
            for row in self.rows.iter().take(n) {
                let _ = writeln!(out, "{}", row.join(","));
            }
        }
        out
    }
}
