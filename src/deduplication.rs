// 🔍 Deduplication - collapse re-downloaded transactions
// Overlapping extracts repeat the same booked transactions. Rows are matched
// on transactionId (keep-first); rows without an id are always kept and get a
// merge key instead, for reconciliation against other sources.

use crate::dataset::render_number;
use crate::loader::RawTransaction;
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// DEDUPLICATION RESULT
// ============================================================================

/// A later row dropped because its transactionId was already seen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedDuplicate {
    pub transaction_id: String,

    /// Position of the kept row in the deduplicated output
    pub kept_index: usize,

    /// Where the dropped copy came from
    pub source_file: String,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct Deduplicated {
    pub kept: Vec<RawTransaction>,
    pub dropped: Vec<DroppedDuplicate>,
}

impl Deduplicated {
    pub fn summary(&self) -> String {
        format!(
            "{} rows kept, {} duplicate transactionIds dropped",
            self.kept.len(),
            self.dropped.len()
        )
    }
}

// ============================================================================
// DEDUPLICATION
// ============================================================================

/// Stable keep-first deduplication on transactionId.
///
/// Input order is file order then intra-file order; the first occurrence of an
/// id wins. Rows without an id never collapse. Ids compare as JSON values, so a
/// numeric `1` and a string `"1"` are different transactions.
pub fn drop_duplicate_ids(transactions: Vec<RawTransaction>) -> Deduplicated {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(transactions.len());
    let mut dropped = Vec::new();

    for tx in transactions {
        let Some(key) = tx.transaction_id_key() else {
            kept.push(tx);
            continue;
        };

        if let Some(&kept_index) = seen.get(&key) {
            dropped.push(DroppedDuplicate {
                transaction_id: tx.transaction_id().unwrap_or_default(),
                kept_index,
                source_file: tx.source_file,
                position: tx.position,
            });
            continue;
        }

        seen.insert(key, kept.len());
        kept.push(tx);
    }

    Deduplicated { kept, dropped }
}

// ============================================================================
// MERGE KEY
// ============================================================================

/// "{bookingDate}_{amount}_{balance}", absent parts render as ""
pub fn merge_key(booking_date: Option<&str>, amount: Option<f64>, balance: Option<f64>) -> String {
    format!(
        "{}_{}_{}",
        booking_date.unwrap_or(""),
        amount.map(render_number).unwrap_or_default(),
        balance.map(render_number).unwrap_or_default()
    )
}

// ============================================================================
// TESTS
// ============================================================================
