//! Module for reading tabular datasets into Arrow record batches.
//!
//! Training data, held-out test data and the disease/category table all arrive
//! as tables with a header row. CSV exports and Parquet files are both accepted;
//! the format is chosen from the file extension.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::util::safe_open_file;
use crate::error::{Result, TriageError};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default batch size for table reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("TRIAGE_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Supported on-disk table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl TableFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("parquet" | "pq") => Ok(Self::Parquet),
            _ => Err(TriageError::data(format!(
                "Unsupported table format for {} (expected .csv or .parquet)",
                path.display()
            ))),
        }
    }
}

/// Read a whole table into record batches
///
/// # Arguments
/// * `path` - CSV or Parquet file
/// * `purpose` - What the table is used for (for error context)
pub fn read_table(path: &Path, purpose: &str) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start(&format!("Reading {purpose} from"), path);

    let batches = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(path, purpose)?,
        TableFormat::Parquet => read_parquet(path, purpose)?,
    };

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("read", path, rows, Some(start.elapsed()));
    Ok(batches)
}

/// Read a CSV file with a header row, inferring column types
fn read_csv(path: &Path, purpose: &str) -> Result<Vec<RecordBatch>> {
    let mut file = safe_open_file(path, purpose)?;

    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)?;
    file.rewind()
        .map_err(|e| TriageError::io_error_with_source("Failed to rewind CSV file", e))
        .map_err(|e| e.with_path(path))?;

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build(file)?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Read a Parquet file into record batches
fn read_parquet(path: &Path, purpose: &str) -> Result<Vec<RecordBatch>> {
    let file = safe_open_file(path, purpose)?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            TableFormat::from_path(Path::new("a/Training.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("a/train.parquet")).unwrap(),
            TableFormat::Parquet
        );
        assert!(TableFormat::from_path(Path::new("a/train.xlsx")).is_err());
    }

    #[test]
    fn test_read_csv_infers_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, "itching,skin rash,prognosis\n1,0,Fungal infection\n0,1,Acne\n")
            .unwrap();

        let batches = read_table(&path, "training data").unwrap();
        let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
        assert_eq!(rows, 2);

        let schema = batches[0].schema();
        assert_eq!(schema.field(0).name(), "itching");
        assert_eq!(schema.field(1).name(), "skin rash");
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_read_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("cough", DataType::Int64, false),
            Field::new("prognosis", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 0, 1])),
                Arc::new(StringArray::from(vec!["Pneumonia", "Acne", "Bronchial Asthma"])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let batches = read_table(&path, "training data").unwrap();
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_table(Path::new("/nonexistent/train.csv"), "training data").unwrap_err();
        assert!(matches!(err, TriageError::IoError { .. }));
    }
}
