// 🧮 Dataset Builder - one deduplicated, enriched table from all extracts
//
// Steps: load → concatenate → dedup on transactionId → re-index →
// extract remittance fields → coerce amount/balance → derive merge_key,
// Income/Expense and Absolute.

use crate::deduplication::{drop_duplicate_ids, merge_key, DroppedDuplicate};
use crate::error::{PipelineError, Result};
use crate::loader::{
    load_transaction_batches, RawTransaction, AMOUNT_COL, BALANCE_COL, BOOKING_DATE_COL,
};
use crate::remittance::{extract_remittance, ExtractedFields, KEY_COLUMNS};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub const PAYMENT_METHOD_COL: &str = "PaymentMethod";
pub const MERGE_KEY_COL: &str = "merge_key";
pub const DIRECTION_COL: &str = "Income/Expense";
pub const ABSOLUTE_COL: &str = "Absolute";

/// Columns appended after the raw transaction columns, in output order
pub fn derived_columns() -> Vec<&'static str> {
    KEY_COLUMNS
        .iter()
        .copied()
        .chain([PAYMENT_METHOD_COL, MERGE_KEY_COL, DIRECTION_COL, ABSOLUTE_COL])
        .collect()
}

// ============================================================================
// DIRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Zero counts as income; no amount, no direction
    pub fn from_amount(amount: Option<f64>) -> Option<Self> {
        amount.map(|a| if a >= 0.0 { Direction::Income } else { Direction::Expense })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Income => "Income",
            Direction::Expense => "Expense",
        }
    }
}

// ============================================================================
// NORMALIZED ROW
// ============================================================================

/// A raw transaction merged with its extracted fields and derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Canonical row reference (0..N-1 after deduplication)
    pub index: usize,
    pub raw: RawTransaction,

    pub booking_date: Option<String>,
    pub amount: Option<f64>,
    pub balance: Option<f64>,

    pub fields: ExtractedFields,

    pub merge_key: String,
    pub direction: Option<Direction>,
    pub absolute: Option<f64>,
}

impl NormalizedRow {
    pub fn normalize(index: usize, raw: RawTransaction) -> Self {
        let fields = extract_remittance(&raw.remittance());
        let booking_date = raw.booking_date();
        let amount = raw.amount().and_then(coerce_numeric);
        let balance = raw.balance().and_then(coerce_numeric);

        NormalizedRow {
            index,
            merge_key: merge_key(booking_date.as_deref(), amount, balance),
            direction: Direction::from_amount(amount),
            absolute: amount.map(f64::abs),
            booking_date,
            amount,
            balance,
            fields,
            raw,
        }
    }

    /// Text of one cell; `None` when the value is absent
    pub fn cell(&self, column: &str) -> Option<String> {
        match column {
            MERGE_KEY_COL => Some(self.merge_key.clone()),
            DIRECTION_COL => self.direction.map(|d| d.label().to_string()),
            ABSOLUTE_COL => self.absolute.map(render_number),
            AMOUNT_COL => self.amount.map(render_number),
            BALANCE_COL => self.balance.map(render_number),
            BOOKING_DATE_COL => self.booking_date.clone(),
            PAYMENT_METHOD_COL => self.fields.value(column).map(str::to_string),
            c if KEY_COLUMNS.contains(&c) => self.fields.value(c).map(str::to_string),
            other => self.raw.column(other).map(render_value),
        }
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Ordered rows; no two rows share a present transactionId
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<NormalizedRow>,
    raw_columns: Vec<String>,
    dropped: Vec<DroppedDuplicate>,
}

impl Dataset {
    /// Normalize already-loaded transactions (file order, then intra-file order)
    pub fn from_transactions(transactions: Vec<RawTransaction>) -> Self {
        let deduplicated = drop_duplicate_ids(transactions);
        info!("Deduplicated: {}", deduplicated.summary());

        let raw_columns = raw_column_order(&deduplicated.kept);
        let rows = deduplicated
            .kept
            .into_iter()
            .enumerate()
            .map(|(index, raw)| NormalizedRow::normalize(index, raw))
            .collect();

        Dataset {
            rows,
            raw_columns,
            dropped: deduplicated.dropped,
        }
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&NormalizedRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows removed as repeated transactionIds
    pub fn dropped_duplicates(&self) -> &[DroppedDuplicate] {
        &self.dropped
    }

    /// Raw columns in first-appearance order, then the derived columns
    pub fn columns(&self) -> Vec<String> {
        let derived = derived_columns();
        self.raw_columns
            .iter()
            .filter(|c| !derived.contains(&c.as_str()))
            .cloned()
            .chain(derived.iter().map(|c| c.to_string()))
            .collect()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<String> {
        self.rows.get(row).and_then(|r| r.cell(column))
    }

    /// One column as text, in row order
    pub fn column(&self, name: &str) -> Vec<Option<String>> {
        self.rows.iter().map(|r| r.cell(name)).collect()
    }

    pub fn merge_keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.merge_key.as_str()).collect()
    }
}

/// Build the dataset from every extract file in `extracts_dir`
pub fn build_dataset(extracts_dir: &Path) -> Result<Dataset> {
    let transactions: Vec<RawTransaction> = load_transaction_batches(extracts_dir)?
        .into_iter()
        .flat_map(|batch| batch.transactions)
        .collect();

    if transactions.is_empty() {
        return Err(PipelineError::NoDataFound {
            dir: extracts_dir.to_path_buf(),
        });
    }

    let dataset = Dataset::from_transactions(transactions);
    info!(
        "Built dataset: {} rows, {} columns",
        dataset.len(),
        dataset.columns().len()
    );
    Ok(dataset)
}

// ============================================================================
// COLUMN HELPERS
// ============================================================================

fn raw_column_order(transactions: &[RawTransaction]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for tx in transactions {
        for name in tx.columns.keys() {
            if seen.insert(name.as_str()) {
                order.push(name.clone());
            }
        }
    }
    order
}

/// Numeric value of a cell; anything unparsable is absent, never an error
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Float text as the exports show it: "100.0", "-12.5", "1e+16", "1.5e-05"
pub fn render_number(value: f64) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return scientific(value);
    }
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Shortest mantissa, signed exponent of at least two digits
fn scientific(value: f64) -> String {
    let text = format!("{:e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => text.clone(),
        },
        None => text.clone(),
    }
}

/// Cell text of a raw JSON value; null is absent
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(render_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
