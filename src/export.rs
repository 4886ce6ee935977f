// 💾 Export - dataset to CSV, key report to JSON

use crate::data_quality::ValidationReport;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write the dataset as CSV: header = `Dataset::columns()`, absent cells empty
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let columns = dataset.columns();
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(&columns)?;
    for row in dataset.rows() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.cell(column).unwrap_or_default())
            .collect();
        csv_writer.write_record(&record)?;
    }

    csv_writer
        .flush()
        .map_err(|e| PipelineError::Csv(csv::Error::from(e)))?;
    Ok(())
}

pub fn write_dataset_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    write_dataset(dataset, BufWriter::new(file))?;
    info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Pretty JSON: { total_rows, all_keys_complete_pct, per_key: [...] }
pub fn write_report(report: &ValidationReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))?;
    info!("Key validation report saved to {}", path.display());
    Ok(())
}

pub fn read_report(path: &Path) -> Result<ValidationReport> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_quality::validate_dataset;
    use crate::loader::RawTransaction;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_dataset() -> Dataset {
        let entries = [
            json!({
                "transactionId": "A",
                "bookingDate": "2024-05-01",
                "transactionAmount": { "amount": "-20.00" },
                "remittanceInformationUnstructuredArray": ["Naam: Bakker, De", "BEA"]
            }),
            json!({
                "transactionId": "B",
                "bookingDate": "2024-05-02",
                "transactionAmount": { "amount": "n/a" }
            }),
        ];
        let txs = entries
            .iter()
            .enumerate()
            .map(|(i, e)| RawTransaction::from_json(e.as_object().unwrap(), "x.json", i))
            .collect();
        Dataset::from_transactions(txs)
    }

    #[test]
    fn test_csv_header_and_cells() {
        let dataset = sample_dataset();
        let mut buffer = Vec::new();
        write_dataset(&dataset, &mut buffer).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, dataset.columns());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);

        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        assert_eq!(&records[0][col("Naam")], "Bakker, De");
        assert_eq!(&records[0][col("PaymentMethod")], "BEA");
        assert_eq!(&records[0][col("transactionAmount.amount")], "-20.0");
        assert_eq!(&records[0][col("Income/Expense")], "Expense");
        assert_eq!(&records[1][col("transactionAmount.amount")], "");
        assert_eq!(&records[1][col("merge_key")], "2024-05-02__");
        assert_eq!(&records[1][col("remittanceInformationUnstructuredArray")], "");
    }

    #[test]
    fn test_report_written_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key_validation_report.json");
        let report = validate_dataset(&sample_dataset());

        write_report(&report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"all_keys_complete_pct\""));

        let back = read_report(&path).unwrap();
        assert_eq!(back, report);
    }
}
