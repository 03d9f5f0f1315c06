//! CSV export of the study log.
//!
//! The whole log is serialized in memory and written with the same
//! temp-file-and-rename step the results store uses, so an interrupted
//! export never leaves a half-written file behind.

use crate::store::write_atomic;
use crate::{Error, Result, ResultRecord};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    front: &'a str,
    back: &'a str,
    result: String,
    timestamp: String,
}

impl<'a> From<&'a ResultRecord> for CsvRow<'a> {
    fn from(record: &'a ResultRecord) -> Self {
        CsvRow {
            front: &record.front,
            back: &record.back,
            result: record.outcome.to_string(),
            timestamp: record.studied_on.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Write `log` to `csv_path` with a header row, replacing any existing file.
///
/// Returns the number of records written.
pub fn export_csv(log: &[ResultRecord], csv_path: &Path) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    if log.is_empty() {
        // serialize() emits headers lazily, so write them explicitly
        writer.write_record(["front", "back", "result", "timestamp"])?;
    }
    for record in log {
        writer.serialize(CsvRow::from(record))?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    write_atomic(csv_path, &bytes)?;

    tracing::info!("Exported {} result(s) to {:?}", log.len(), csv_path);
    Ok(log.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, Outcome};
    use chrono::NaiveDate;

    fn record(front: &str, outcome: Outcome, day: u32) -> ResultRecord {
        ResultRecord::new(
            &Card::new(front, "back, with comma"),
            outcome,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        )
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out/results.csv");

        let log = vec![record("a", Outcome::Pass, 7), record("b", Outcome::Fail, 8)];
        let count = export_csv(&log, &csv_path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["front", "back", "result", "timestamp"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "back, with comma");
        assert_eq!(&rows[0][2], "pass");
        assert_eq!(&rows[1][2], "fail");
        assert_eq!(&rows[1][3], "2024-01-08");
    }

    #[test]
    fn test_export_replaces_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("results.csv");

        export_csv(&[record("a", Outcome::Pass, 1), record("b", Outcome::Pass, 2)], &csv_path)
            .unwrap();
        export_csv(&[record("c", Outcome::Fail, 3)], &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 1);
    }

    #[test]
    fn test_export_empty_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("results.csv");

        assert_eq!(export_csv(&[], &csv_path).unwrap(), 0);
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(contents.trim(), "front,back,result,timestamp");
    }
}
