// 🚀 Pipeline - extracts → dataset CSV → key validation report

use crate::config::PipelineSettings;
use crate::data_quality::{validate_keys, ValidationReport};
use crate::dataset::{build_dataset, Dataset};
use crate::error::{PipelineError, Result};
use crate::export::{write_dataset_csv, write_report};
use crate::loader::EXTRACT_PATTERN;
use crate::remittance::KEY_COLUMNS;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DATASET_CSV: &str = "transactions_dataset.csv";
pub const KEY_REPORT_JSON: &str = "key_validation_report.json";

/// Paths and summary of one completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineArtifacts {
    pub dataset_csv: PathBuf,
    pub key_report: PathBuf,
    pub rows: usize,
    pub duplicates_dropped: usize,
    pub report: ValidationReport,
    pub completed_at: DateTime<Utc>,
}

/// Build the dataset, write the CSV and the key report into the analysis dir
pub fn run_pipeline(settings: &PipelineSettings) -> Result<PipelineArtifacts> {
    settings.validate()?;
    settings.ensure_directories()?;

    let dataset = build_dataset(&settings.extracts_dir())?;

    let analysis_dir = settings.analysis_dir();
    let dataset_csv = analysis_dir.join(DATASET_CSV);
    write_dataset_csv(&dataset, &dataset_csv)?;

    let report = validate(&dataset, settings);
    let key_report = analysis_dir.join(KEY_REPORT_JSON);
    write_report(&report, &key_report)?;

    info!("Pipeline run completed: {}", report.summary());

    Ok(PipelineArtifacts {
        dataset_csv,
        key_report,
        rows: dataset.len(),
        duplicates_dropped: dataset.dropped_duplicates().len(),
        report,
        completed_at: Utc::now(),
    })
}

/// Build and validate without writing anything
pub fn validate_extracts(settings: &PipelineSettings) -> Result<ValidationReport> {
    settings.validate()?;
    let dataset = build_dataset(&settings.extracts_dir())?;
    Ok(validate(&dataset, settings))
}

fn validate(dataset: &Dataset, settings: &PipelineSettings) -> ValidationReport {
    validate_keys(dataset, &KEY_COLUMNS, settings.sample_size)
}

// ============================================================================
// EXTRACT PERSISTENCE
// ============================================================================

/// Extract filename for a download at `at`
pub fn extract_file_name(at: DateTime<Utc>) -> String {
    EXTRACT_PATTERN.replacen('*', &at.format("%Y%m%d_%H%M%S").to_string(), 1)
}

/// Write an already-downloaded payload into the extracts directory
pub fn persist_extract(payload: &Value, extracts_dir: &Path) -> Result<PathBuf> {
    persist_extract_at(payload, extracts_dir, Utc::now())
}

pub fn persist_extract_at(payload: &Value, extracts_dir: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(extracts_dir).map_err(|e| PipelineError::io(extracts_dir, e))?;

    let path = extracts_dir.join(extract_file_name(at));
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))?;

    info!("Saved raw extract to {}", path.display());
    Ok(path)
}

/// Read a payload file and persist it as a new extract
pub fn ingest_payload_file(source: &Path, extracts_dir: &Path) -> Result<PathBuf> {
    let text = fs::read_to_string(source).map_err(|e| PipelineError::io(source, e))?;
    let payload: Value = serde_json::from_str(&text).map_err(|e| PipelineError::MalformedExtract {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    persist_extract(&payload, extracts_dir)
}
