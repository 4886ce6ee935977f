// Bankdata Pipeline - Core Library
// Normalizes open-banking transaction extracts into one dataset and reports
// how well the remittance fields are covered.

pub mod error;
pub mod remittance;     // Field extraction from remittance text
pub mod loader;         // Extract files → raw transaction batches
pub mod deduplication;  // transactionId dedup + merge key
pub mod dataset;        // Normalized dataset
pub mod data_quality;   // Key coverage validation
pub mod export;         // CSV / JSON writers
pub mod config;
pub mod pipeline;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use remittance::{
    extract_fields, extract_remittance,
    ExtractedFields, PaymentMethod, RemittanceKey, RemittanceText, KEY_COLUMNS,
};
pub use loader::{
    load_transaction_batches, load_extract_file, list_extract_files,
    RawBatch, RawTransaction,
    AMOUNT_COL, BALANCE_COL, BOOKING_DATE_COL, REMITTANCE_COL, TRANSACTION_ID_COL,
};
pub use deduplication::{drop_duplicate_ids, merge_key, Deduplicated, DroppedDuplicate};
pub use dataset::{
    build_dataset, coerce_numeric, Dataset, Direction, NormalizedRow,
    ABSOLUTE_COL, DIRECTION_COL, MERGE_KEY_COL, PAYMENT_METHOD_COL,
};
pub use data_quality::{
    validate_dataset, validate_keys, FieldTable, KeyResult, ValidationReport, DEFAULT_SAMPLE_SIZE,
};
pub use export::{read_report, write_dataset, write_dataset_csv, write_report};
pub use config::PipelineSettings;
pub use pipeline::{
    ingest_payload_file, persist_extract, run_pipeline, validate_extracts, PipelineArtifacts,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
