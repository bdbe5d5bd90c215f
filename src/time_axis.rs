// SynthTS - Time axis
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Time axis for single-series generation.
//!
//! An axis is the half-open range `[start, end)` stepped by the process
//! time, truncated to whole steps. Every series generated over an axis has
//! exactly `axis.len()` samples.

use crate::error::{Result, SynthError};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp format accepted by [`TimeAxis::parse`] and used for export.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MS_PER_MINUTE: f64 = 60_000.0;

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|source| {
        SynthError::TimeParse {
            value: value.to_string(),
            source,
        }
    })
}

/// Sampling grid of a synthetic series.
///
/// Serialized as a [`TimeConfig`]; deserialization runs the same checks as
/// [`TimeAxis::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeConfig", into = "TimeConfig")]
pub struct TimeAxis {
    start: NaiveDateTime,
    end: NaiveDateTime,
    step_minutes: f64,
}

impl TimeAxis {
    /// Create an axis from parsed timestamps and a step in minutes.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step_minutes: f64) -> Result<Self> {
        if !step_minutes.is_finite() || (step_minutes * MS_PER_MINUTE).round() < 1.0 {
            return Err(SynthError::invalid(
                "process_time_mins",
                format!("must be a positive step of at least 1ms, got {}", step_minutes),
            ));
        }
        if end <= start {
            return Err(SynthError::invalid(
                "end_time",
                format!("must be after start time {}", start.format(TIME_FORMAT)),
            ));
        }
        Ok(Self {
            start,
            end,
            step_minutes,
        })
    }

    /// Parse an axis from `YYYY-MM-DD HH:MM:SS` strings.
    pub fn parse(start: &str, end: &str, step_minutes: f64) -> Result<Self> {
        Self::new(parse_time(start)?, parse_time(end)?, step_minutes)
    }

    /// First timestamp.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Process time in minutes.
    pub fn step_minutes(&self) -> f64 {
        self.step_minutes
    }

    /// Process time as a duration.
    pub fn step(&self) -> Duration {
        Duration::milliseconds((self.step_minutes * MS_PER_MINUTE).round() as i64)
    }

    /// Total covered time.
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Number of samples: whole steps in `[start, end)`.
    pub fn len(&self) -> usize {
        let minutes = self.duration().num_milliseconds() as f64 / MS_PER_MINUTE;
        (minutes / self.step_minutes).floor() as usize
    }

    /// Check if the axis holds no sample.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp of sample `index`.
    pub fn timestamp(&self, index: usize) -> NaiveDateTime {
        self.start + Duration::milliseconds(self.step().num_milliseconds() * index as i64)
    }

    /// All sample timestamps.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        (0..self.len()).map(|i| self.timestamp(i)).collect()
    }

    /// Temporal midpoint between start and end.
    pub fn midpoint(&self) -> NaiveDateTime {
        self.end - self.duration() / 2
    }

    /// Sample index at which `time` falls, by elapsed whole steps.
    ///
    /// The result may exceed `len()` for times at or past `end`.
    pub fn index_of(&self, time: NaiveDateTime) -> Result<usize> {
        if time < self.start {
            return Err(SynthError::invalid(
                "drift_time",
                format!(
                    "{} is before the axis start {}",
                    time.format(TIME_FORMAT),
                    self.start.format(TIME_FORMAT)
                ),
            ));
        }
        let elapsed = time.signed_duration_since(self.start).num_milliseconds() as f64;
        Ok((elapsed / MS_PER_MINUTE / self.step_minutes).floor() as usize)
    }
}

/// Serde adapter writing timestamps as `YYYY-MM-DD HH:MM:SS`.
pub mod time_format {
    use super::TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Same as [`time_format`] for optional timestamps.
pub mod opt_time_format {
    use super::TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_some(&t.format(TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// Serializable time axis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Start time, `YYYY-MM-DD HH:MM:SS`.
    pub start_time: String,
    /// End time (exclusive), `YYYY-MM-DD HH:MM:SS`.
    pub end_time: String,
    /// Process time in minutes.
    pub process_time_mins: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start_time: "2021-01-01 00:00:00".to_string(),
            end_time: "2021-01-02 00:00:00".to_string(),
            process_time_mins: 10.0, // 144 samples per day
        }
    }
}

impl TimeConfig {
    /// Set start time.
    pub fn with_start_time(mut self, start: &str) -> Self {
        self.start_time = start.to_string();
        self
    }

    /// Set end time.
    pub fn with_end_time(mut self, end: &str) -> Self {
        self.end_time = end.to_string();
        self
    }

    /// Set process time in minutes.
    pub fn with_process_time_mins(mut self, minutes: f64) -> Self {
        self.process_time_mins = minutes;
        self
    }

    /// Build the axis.
    pub fn axis(&self) -> Result<TimeAxis> {
        TimeAxis::parse(&self.start_time, &self.end_time, self.process_time_mins)
    }
}

impl TryFrom<TimeConfig> for TimeAxis {
    type Error = SynthError;

    fn try_from(config: TimeConfig) -> Result<Self> {
        config.axis()
    }
}

impl From<TimeAxis> for TimeConfig {
    fn from(axis: TimeAxis) -> Self {
        Self {
            start_time: axis.start.format(TIME_FORMAT).to_string(),
            end_time: axis.end.format(TIME_FORMAT).to_string(),
            process_time_mins: axis.step_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_axis() -> TimeAxis {
        TimeConfig::default().axis().unwrap()
    }

    #[test]
    fn test_default_axis_len() {
        let axis = day_axis();
        assert_eq!(axis.len(), 144);
        assert_eq!(axis.timestamps().len(), 144);
    }

    #[test]
    fn test_truncates_to_whole_steps() {
        let axis = TimeAxis::parse("2021-01-01 00:00:00", "2021-01-01 01:05:00", 10.0).unwrap();
        assert_eq!(axis.len(), 6);
        assert_eq!(
            axis.timestamp(5),
            parse_time("2021-01-01 00:50:00").unwrap()
        );
    }

    #[test]
    fn test_fractional_step() {
        let axis = TimeAxis::parse("2021-01-01 00:00:00", "2021-01-01 00:01:00", 0.5).unwrap();
        assert_eq!(axis.len(), 2);
        assert_eq!(axis.timestamp(1), parse_time("2021-01-01 00:00:30").unwrap());
    }

    #[test]
    fn test_midpoint() {
        let axis = day_axis();
        assert_eq!(axis.midpoint(), parse_time("2021-01-01 12:00:00").unwrap());
        assert_eq!(axis.index_of(axis.midpoint()).unwrap(), 72);
    }

    #[test]
    fn test_index_of() {
        let axis = day_axis();
        assert_eq!(axis.index_of(axis.start()).unwrap(), 0);
        let t = parse_time("2021-01-01 00:25:00").unwrap();
        assert_eq!(axis.index_of(t).unwrap(), 2);
        let before = parse_time("2020-12-31 23:59:00").unwrap();
        assert!(matches!(
            axis.index_of(before),
            Err(SynthError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_axis() {
        assert!(TimeAxis::parse("2021-01-02 00:00:00", "2021-01-01 00:00:00", 10.0).is_err());
        assert!(TimeAxis::parse("2021-01-01 00:00:00", "2021-01-02 00:00:00", 0.0).is_err());
        assert!(TimeAxis::parse("2021-01-01 00:00:00", "2021-01-02 00:00:00", -5.0).is_err());
    }

    #[test]
    fn test_parse_error() {
        let err = TimeAxis::parse("2021/01/01", "2021-01-02 00:00:00", 10.0).unwrap_err();
        assert!(matches!(err, SynthError::TimeParse { .. }));
    }

    #[test]
    fn test_axis_json_is_validated() {
        let axis = day_axis();
        let json = serde_json::to_string(&axis).unwrap();
        assert!(json.contains("\"start_time\":\"2021-01-01 00:00:00\""));
        let parsed: TimeAxis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, axis);

        let zero_step = r#"{
            "start_time": "2021-01-01 00:00:00",
            "end_time": "2021-01-02 00:00:00",
            "process_time_mins": 0.0
        }"#;
        assert!(serde_json::from_str::<TimeAxis>(zero_step).is_err());

        let reversed = r#"{
            "start_time": "2021-01-02 00:00:00",
            "end_time": "2021-01-01 00:00:00",
            "process_time_mins": 10.0
        }"#;
        assert!(serde_json::from_str::<TimeAxis>(reversed).is_err());
    }
}
