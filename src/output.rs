//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append/write. The
//! tabular column convention mirrors the input schema contract, so the rows
//! written here are what downstream consumers read back verbatim.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a result record using Rust's debug pretty-print format.
pub fn print_pretty<T: Serialize + std::fmt::Debug>(record: &T) {
    debug!("{:#?}", record);
}

/// Logs a result record as pretty-printed JSON.
pub fn print_json<T: Serialize>(record: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// Appends a serializable record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record<T: Serialize>(path: &str, record: &T) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

/// Writes a whole result table to a CSV file, creating parent directories.
///
/// Overwrites any existing file at `path`.
pub fn save_results<T: Serialize>(rows: &[T], path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path, rows = rows.len(), "Results saved");
    Ok(())
}

/// Writes a single record as a one-row table.
pub fn save_result<T: Serialize>(record: &T, path: &str) -> Result<()> {
    save_results(std::slice::from_ref(record), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compare::ComparisonMetrics;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        let metrics = ComparisonMetrics::default();
        print_pretty(&metrics);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let metrics = ComparisonMetrics::default();
        print_json(&metrics).unwrap();
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("signal_timing_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        let metrics = ComparisonMetrics::default();
        append_record(&path, &metrics).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("signal_timing_test_header.csv");
        let _ = fs::remove_file(&path);

        let metrics = ComparisonMetrics::default();
        append_record(&path, &metrics).unwrap();
        append_record(&path, &metrics).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content
            .lines()
            .filter(|l| l.contains("baseline_avg_delay"))
            .count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_results_creates_parent_dirs() {
        let dir = temp_path("signal_timing_test_nested");
        let _ = fs::remove_dir_all(&dir);
        let path = format!("{dir}/inner/results.csv");

        let rows = vec![ComparisonMetrics::default(), ComparisonMetrics::default()];
        save_results(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_result_wraps_single_record_as_one_row_table() {
        let path = temp_path("signal_timing_test_single.csv");
        let _ = fs::remove_file(&path);

        let metrics = ComparisonMetrics {
            baseline_avg_delay: 10.0,
            alternative_avg_delay: 8.0,
            avg_delay_reduction: 2.0,
            throughput_change_pct: 20.0,
            improvement_pct: 20.0,
        };
        save_result(&metrics, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("improvement_pct"));
        assert!(lines[1].contains("20.0"));

        fs::remove_file(&path).unwrap();
    }
}
