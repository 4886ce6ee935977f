// 📂 Frame Loader - reads booked transactions from downloaded extracts
//
// Extract files are named "<YYYYmmdd_HHMMSS>_transactions_summary.json" and
// hold the aggregation API payload: { "transactions": { "booked": [...] } }

use crate::error::{PipelineError, Result};
use crate::remittance::RemittanceText;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Filename pattern of extract files inside the extracts directory
pub const EXTRACT_PATTERN: &str = "*_transactions_summary.json";

pub const TRANSACTION_ID_COL: &str = "transactionId";
pub const BOOKING_DATE_COL: &str = "bookingDate";
pub const AMOUNT_COL: &str = "transactionAmount.amount";
pub const BALANCE_COL: &str = "balanceAfterTransaction.balanceAmount.amount";
pub const REMITTANCE_COL: &str = "remittanceInformationUnstructuredArray";

// ============================================================================
// CORE TYPES
// ============================================================================

/// RawTransaction - one booked transaction as the API returned it
///
/// `columns` holds every attribute with nested objects flattened to dotted
/// names ("transactionAmount.amount"), in the order they appear.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub columns: Map<String, Value>,

    // Provenance
    pub source_file: String,
    pub position: usize,
}

impl RawTransaction {
    /// Flatten one booked entry into a raw transaction
    pub fn from_json(entry: &Map<String, Value>, source_file: &str, position: usize) -> Self {
        let mut columns = Map::new();
        flatten_into(&mut columns, None, entry);
        RawTransaction {
            columns,
            source_file: source_file.to_string(),
            position,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name).filter(|v| !v.is_null())
    }

    pub fn transaction_id(&self) -> Option<String> {
        self.column(TRANSACTION_ID_COL).map(scalar_text)
    }

    /// Identity used for deduplication: the id's JSON text, so `1` and `"1"`
    /// stay distinct
    pub fn transaction_id_key(&self) -> Option<String> {
        self.column(TRANSACTION_ID_COL).map(Value::to_string)
    }

    /// Booking date as opaque text, never parsed as a calendar date
    pub fn booking_date(&self) -> Option<String> {
        self.column(BOOKING_DATE_COL).map(scalar_text)
    }

    pub fn amount(&self) -> Option<&Value> {
        self.column(AMOUNT_COL)
    }

    pub fn balance(&self) -> Option<&Value> {
        self.column(BALANCE_COL)
    }

    pub fn remittance(&self) -> RemittanceText {
        RemittanceText::from_json(self.column(REMITTANCE_COL))
    }
}

/// RawBatch - the booked transactions of one extract file
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub source: PathBuf,
    pub transactions: Vec<RawTransaction>,
}

// ============================================================================
// LOADING
// ============================================================================

/// Extract files in `extracts_dir`, sorted by filename (= by download time)
pub fn list_extract_files(extracts_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&extracts_dir.to_string_lossy()),
        EXTRACT_PATTERN
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| PipelineError::Config(format!("Invalid extract pattern {}: {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every extract file in `extracts_dir` as one batch per file.
///
/// Files without a booked list (or with an empty one) are skipped. A file that
/// is not valid JSON aborts the load with `MalformedExtract`.
pub fn load_transaction_batches(extracts_dir: &Path) -> Result<Vec<RawBatch>> {
    let files = list_extract_files(extracts_dir)?;
    debug!("Found {} extract files in {}", files.len(), extracts_dir.display());

    let mut batches = Vec::new();
    for path in files {
        match load_extract_file(&path)? {
            Some(batch) => {
                debug!(
                    "Loaded {} booked transactions from {}",
                    batch.transactions.len(),
                    batch.source.display()
                );
                batches.push(batch);
            }
            None => warn!("Skipping {}: no booked transactions", path.display()),
        }
    }

    info!(
        "Loaded {} batches ({} transactions) from {}",
        batches.len(),
        batches.iter().map(|b| b.transactions.len()).sum::<usize>(),
        extracts_dir.display()
    );
    Ok(batches)
}

/// Parse a single extract file; `None` when it holds no booked transactions
pub fn load_extract_file(path: &Path) -> Result<Option<RawBatch>> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let payload: Value = serde_json::from_str(&text).map_err(|e| PipelineError::MalformedExtract {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.json")
        .to_string();

    let booked = match booked_entries(&payload) {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Ok(None),
    };

    let mut transactions = Vec::with_capacity(booked.len());
    for (position, entry) in booked.iter().enumerate() {
        let object = entry.as_object().ok_or_else(|| PipelineError::MalformedExtract {
            path: path.to_path_buf(),
            reason: format!("booked entry {} is not an object", position),
        })?;
        transactions.push(RawTransaction::from_json(object, &filename, position));
    }

    Ok(Some(RawBatch {
        source: path.to_path_buf(),
        transactions,
    }))
}

fn booked_entries(payload: &Value) -> Option<&Vec<Value>> {
    payload.get("transactions")?.get("booked")?.as_array()
}

// ============================================================================
// HELPERS
// ============================================================================

/// Nested objects become dotted column names; arrays stay as values
fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

/// Text form of a scalar JSON value (strings without quotes)
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
