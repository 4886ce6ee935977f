// ✅ Key Validation - coverage of the extracted remittance fields
//
// For every key: how many rows carry a non-blank value, which rows miss it,
// and how many rows have all keys at once.

use crate::dataset::Dataset;
use crate::remittance::KEY_COLUMNS;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Missing-row indices kept per key
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

// ============================================================================
// TABLE SEAM
// ============================================================================

/// FieldTable - any rows × named columns table the validator can read
///
/// The validator only needs row count and cell text, so it works over a
/// `Dataset` as well as any other tabular shape.
pub trait FieldTable {
    fn row_count(&self) -> usize;

    /// Cell text, `None` when absent or when the column does not exist
    fn cell_text(&self, row: usize, column: &str) -> Option<String>;
}

impl FieldTable for Dataset {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn cell_text(&self, row: usize, column: &str) -> Option<String> {
        self.cell(row, column)
    }
}

// ============================================================================
// VALIDATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub key: String,
    pub coverage_pct: f64,
    pub missing_count: usize,
    pub sample_missing: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub all_keys_complete_pct: f64,
    pub per_key: Vec<KeyResult>,
}

impl ValidationReport {
    pub fn empty() -> Self {
        ValidationReport {
            total_rows: 0,
            all_keys_complete_pct: 0.0,
            per_key: Vec::new(),
        }
    }

    pub fn key(&self, name: &str) -> Option<&KeyResult> {
        self.per_key.iter().find(|r| r.key == name)
    }

    pub fn summary(&self) -> String {
        let weakest = self
            .per_key
            .iter()
            .min_by(|a, b| a.coverage_pct.total_cmp(&b.coverage_pct))
            .map(|r| format!("{} at {:.2}%", r.key, r.coverage_pct))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "{} rows: {:.2}% with all keys | lowest coverage: {}",
            self.total_rows, self.all_keys_complete_pct, weakest
        )
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Coverage of `keys` over `table`.
///
/// A cell is missing when absent or blank after trimming. Samples hold the
/// first `sample_size` missing row indices in ascending order.
pub fn validate_keys<T: FieldTable + ?Sized>(
    table: &T,
    keys: &[&str],
    sample_size: usize,
) -> ValidationReport {
    let total_rows = table.row_count();
    if total_rows == 0 {
        return ValidationReport::empty();
    }

    let mut all_complete = vec![true; total_rows];
    let mut per_key = Vec::with_capacity(keys.len());

    for &key in keys {
        let mut missing_count = 0;
        let mut sample_missing = Vec::new();

        for (row, complete) in all_complete.iter_mut().enumerate() {
            if !is_missing(table.cell_text(row, key)) {
                continue;
            }
            missing_count += 1;
            *complete = false;
            if sample_missing.len() < sample_size {
                sample_missing.push(row);
            }
        }

        per_key.push(KeyResult {
            key: key.to_string(),
            coverage_pct: percentage(total_rows - missing_count, total_rows),
            missing_count,
            sample_missing,
        });
    }

    let complete_rows = all_complete.iter().filter(|c| **c).count();
    let report = ValidationReport {
        total_rows,
        all_keys_complete_pct: percentage(complete_rows, total_rows),
        per_key,
    };
    info!("Key validation: {}", report.summary());
    report
}

/// Coverage of the nine remittance keys with the default sample size
pub fn validate_dataset(dataset: &Dataset) -> ValidationReport {
    validate_keys(dataset, &KEY_COLUMNS, DEFAULT_SAMPLE_SIZE)
}

fn is_missing(cell: Option<String>) -> bool {
    cell.map_or(true, |text| text.trim().is_empty())
}

fn percentage(part: usize, total: usize) -> f64 {
    round2(100.0 * part as f64 / total as f64)
}

/// Two decimals, rounding the exact binary value (0.125 -> 0.12)
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

// ============================================================================
// TESTS
// ============================================================================
