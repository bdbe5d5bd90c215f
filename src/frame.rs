// SynthTS - Series frames
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Two-column `(time, value)` tables and their CSV/JSON export.
//!
//! Frames are the hand-off point to plotting tools and fixture files.

use crate::series::{Series, SeriesStats};
use crate::time_axis::{time_format, TimeAxis, TIME_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Export error types.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Length mismatch: axis has {axis} samples, series has {series}")]
    LengthMismatch { axis: usize, series: usize },

    #[error("Empty file")]
    Empty,
}

/// One `(time, value)` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    #[serde(with = "time_format")]
    pub time: NaiveDateTime,
    pub value: f64,
}

/// A single series with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFrame {
    /// Name of the value column.
    pub column: String,
    pub rows: Vec<FrameRow>,
}

impl SeriesFrame {
    /// Pair a series with its axis.
    pub fn new(column: &str, axis: &TimeAxis, values: &[f64]) -> Result<Self, ExportError> {
        if values.len() != axis.len() {
            return Err(ExportError::LengthMismatch {
                axis: axis.len(),
                series: values.len(),
            });
        }
        Ok(Self::zip(column, axis, values))
    }

    /// Pair without checking lengths; extra samples on either side are dropped.
    pub(crate) fn zip(column: &str, axis: &TimeAxis, values: &[f64]) -> Self {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &value)| FrameRow {
                time: axis.timestamp(i),
                value,
            })
            .take(axis.len())
            .collect();
        Self {
            column: column.to_string(),
            rows,
        }
    }

    /// Get number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value column.
    pub fn values(&self) -> Series {
        self.rows.iter().map(|r| r.value).collect()
    }

    /// Time column.
    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// Statistics of the value column.
    pub fn stats(&self) -> Option<SeriesStats> {
        SeriesStats::of(&self.values())
    }

    /// Export to CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["time", self.column.as_str()])?;
        for row in &self.rows {
            let time = row.time.format(TIME_FORMAT).to_string();
            writer.write_record([time, row.value.to_string()])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Import from CSV file.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(ExportError::Empty);
        }
        if headers.get(0).map(str::trim) != Some("time") {
            return Err(ExportError::MissingColumn("time".to_string()));
        }
        let column = headers
            .get(1)
            .ok_or_else(|| ExportError::MissingColumn("value".to_string()))?
            .to_string();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line() as usize);

            let time = record
                .get(0)
                .and_then(|t| NaiveDateTime::parse_from_str(t.trim(), TIME_FORMAT).ok())
                .ok_or_else(|| ExportError::CsvParse {
                    line,
                    message: "Invalid timestamp".to_string(),
                })?;
            let value: f64 = record
                .get(1)
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| ExportError::CsvParse {
                    line,
                    message: format!("Invalid value for {}", column),
                })?;
            rows.push(FrameRow { time, value });
        }

        Ok(Self { column, rows })
    }

    /// Export to JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Import from JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_axis::parse_time;
    use tempfile::NamedTempFile;

    fn hour_axis() -> TimeAxis {
        TimeAxis::parse("2021-01-01 00:00:00", "2021-01-01 01:00:00", 15.0).unwrap()
    }

    #[test]
    fn test_new_checks_length() {
        let axis = hour_axis();
        assert!(matches!(
            SeriesFrame::new("v", &axis, &[1.0, 2.0]),
            Err(ExportError::LengthMismatch { axis: 4, series: 2 })
        ));

        let frame = SeriesFrame::new("v", &axis, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.rows[3].time, parse_time("2021-01-01 00:45:00").unwrap());
        assert_eq!(frame.values(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.stats().unwrap().mean, 2.5);
    }

    #[test]
    fn test_csv_roundtrip() {
        let axis = hour_axis();
        let frame = SeriesFrame::new("anomaly_data", &axis, &[0.5, -1.25, 3.0, 2.0]).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        frame.to_csv(temp_file.path()).unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(contents.starts_with("time,anomaly_data\n2021-01-01 00:00:00,0.5\n"));

        let loaded = SeriesFrame::from_csv(temp_file.path()).unwrap();
        assert_eq!(loaded, frame);
    }

    #[test]
    fn test_csv_bad_value() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "time,v\n2021-01-01 00:00:00,abc\n").unwrap();
        assert!(matches!(
            SeriesFrame::from_csv(temp_file.path()),
            Err(ExportError::CsvParse { line: 2, .. })
        ));
    }

    #[test]
    fn test_csv_missing_time_column() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "timestamp,v\n").unwrap();
        assert!(matches!(
            SeriesFrame::from_csv(temp_file.path()),
            Err(ExportError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let axis = hour_axis();
        let frame = SeriesFrame::new("drifted_data", &axis, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        frame.to_json(temp_file.path()).unwrap();
        let loaded = SeriesFrame::from_json(temp_file.path()).unwrap();

        assert_eq!(loaded, frame);
    }

    #[test]
    fn test_csv_column_with_delimiter() {
        let axis = hour_axis();
        let frame = SeriesFrame::new("temp,degC", &axis, &[20.5, 21.0, 21.5, 22.0]).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        frame.to_csv(temp_file.path()).unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(contents.starts_with("time,\"temp,degC\"\n"));

        let loaded = SeriesFrame::from_csv(temp_file.path()).unwrap();
        assert_eq!(loaded.column, "temp,degC");
        assert_eq!(loaded, frame);
    }

    #[test]
    fn test_csv_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        assert!(matches!(
            SeriesFrame::from_csv(temp_file.path()),
            Err(ExportError::Empty)
        ));
    }
}
