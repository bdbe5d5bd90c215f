// SynthTS - Concept drift
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Concept drift applied to the tail of a series.
//!
//! The series is split at the sample where the drift time falls. Every
//! sample from that index on is shifted by
//! `mean(after) * pct_drift_mean / 100 * (1 + pct_drift_spread / 100)`.

use crate::error::{Result, SynthError};
use crate::series::{Series, SeriesStats};
use crate::time_axis::{opt_time_format, TimeAxis};
use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

/// Drift parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Mean shift in percent of the post-drift mean.
    pub pct_drift_mean: f64,
    /// Extra amplification of the shift, in percent.
    #[serde(default)]
    pub pct_drift_spread: f64,
    /// Drift start. `None` uses the temporal midpoint of the axis.
    #[serde(
        default,
        with = "opt_time_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub drift_time: Option<NaiveDateTime>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            pct_drift_mean: 20.0,
            pct_drift_spread: 0.0,
            drift_time: None,
        }
    }
}

impl DriftConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mean drift percentage.
    pub fn with_mean_pct(mut self, pct: f64) -> Self {
        self.pct_drift_mean = pct;
        self
    }

    /// Set spread drift percentage.
    pub fn with_spread_pct(mut self, pct: f64) -> Self {
        self.pct_drift_spread = pct;
        self
    }

    /// Set drift start time.
    pub fn with_drift_time(mut self, time: NaiveDateTime) -> Self {
        self.drift_time = Some(time);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.pct_drift_mean.is_finite() {
            return Err(SynthError::invalid(
                "pct_drift_mean",
                format!("must be finite, got {}", self.pct_drift_mean),
            ));
        }
        if !self.pct_drift_spread.is_finite() {
            return Err(SynthError::invalid(
                "pct_drift_spread",
                format!("must be finite, got {}", self.pct_drift_spread),
            ));
        }
        Ok(())
    }

    fn factor(&self) -> f64 {
        (self.pct_drift_mean / 100.0) * (1.0 + self.pct_drift_spread / 100.0)
    }
}

/// Drifted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    pub series: Series,
    /// First shifted sample.
    pub drift_index: usize,
    /// Constant added from `drift_index` on.
    pub offset: f64,
}

impl Drift {
    /// Samples before the drift.
    pub fn before(&self) -> &[f64] {
        &self.series[..self.drift_index]
    }

    /// Samples from the drift on.
    pub fn after(&self) -> &[f64] {
        &self.series[self.drift_index..]
    }
}

/// Shift the part of `series` at and after the drift time.
pub fn apply_drift(series: &[f64], axis: &TimeAxis, config: &DriftConfig) -> Result<Drift> {
    config.validate()?;
    if series.len() != axis.len() {
        return Err(SynthError::invalid(
            "series",
            format!(
                "has {} samples but the time axis has {}",
                series.len(),
                axis.len()
            ),
        ));
    }

    let drift_time = config.drift_time.unwrap_or_else(|| axis.midpoint());
    let drift_index = axis.index_of(drift_time)?.min(series.len());

    let offset = SeriesStats::of(&series[drift_index..])
        .map(|after| after.mean * config.factor())
        .unwrap_or(0.0);

    let mut values = series.to_vec();
    values[drift_index..].iter_mut().for_each(|v| *v += offset);

    debug!(
        "applied drift at index {} of {} (offset {:.4})",
        drift_index,
        values.len(),
        offset
    );
    Ok(Drift {
        series: values,
        drift_index,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{make_rng, noise};
    use crate::time_axis::{parse_time, TimeConfig};
    use approx::assert_relative_eq;

    fn axis() -> TimeAxis {
        TimeConfig::default().axis().unwrap()
    }

    #[test]
    fn test_constant_offset() {
        let axis = axis();
        let series = vec![10.0; axis.len()];
        let config = DriftConfig::new().with_mean_pct(20.0).with_spread_pct(50.0);
        let drift = apply_drift(&series, &axis, &config).unwrap();

        assert_eq!(drift.drift_index, 72);
        assert_relative_eq!(drift.offset, 3.0, epsilon = 1e-12);
        assert!(drift.before().iter().all(|v| *v == 10.0));
        for v in drift.after() {
            assert_relative_eq!(*v, 13.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_prefix_unchanged_suffix_shifted() {
        let axis = axis();
        let series = noise(axis.len(), 5.0, 1.0, &mut make_rng(Some(21))).unwrap();
        let drift = apply_drift(&series, &axis, &DriftConfig::default()).unwrap();

        let idx = drift.drift_index;
        assert_eq!(&drift.series[..idx], &series[..idx]);

        let mean_after = series[idx..].iter().sum::<f64>() / (series.len() - idx) as f64;
        assert_relative_eq!(drift.offset, mean_after * 0.2, epsilon = 1e-12);
        for (orig, shifted) in series[idx..].iter().zip(drift.after()) {
            assert_relative_eq!(shifted - orig, drift.offset, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_explicit_drift_time() {
        let axis = axis();
        let series = vec![1.0; axis.len()];
        let config = DriftConfig::new().with_drift_time(parse_time("2021-01-01 06:00:00").unwrap());
        let drift = apply_drift(&series, &axis, &config).unwrap();

        assert_eq!(drift.drift_index, 36);
        assert_eq!(drift.series[35], 1.0);
        assert_relative_eq!(drift.series[36], 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_drift_after_end() {
        let axis = axis();
        let series = vec![1.0; axis.len()];
        let config = DriftConfig::new().with_drift_time(parse_time("2021-01-03 00:00:00").unwrap());
        let drift = apply_drift(&series, &axis, &config).unwrap();

        assert_eq!(drift.drift_index, series.len());
        assert_eq!(drift.offset, 0.0);
        assert_eq!(drift.series, series);
    }

    #[test]
    fn test_drift_before_start() {
        let axis = axis();
        let series = vec![1.0; axis.len()];
        let config = DriftConfig::new().with_drift_time(parse_time("2020-12-31 00:00:00").unwrap());
        assert!(matches!(
            apply_drift(&series, &axis, &config),
            Err(SynthError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let axis = axis();
        let series = vec![1.0; 10];
        assert!(apply_drift(&series, &axis, &DriftConfig::default()).is_err());
    }

    #[test]
    fn test_config_json() {
        let config = DriftConfig::new().with_drift_time(parse_time("2021-01-01 06:00:00").unwrap());
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("2021-01-01 06:00:00"));

        let parsed: DriftConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let minimal: DriftConfig = serde_json::from_str(r#"{"pct_drift_mean": 5.0}"#).unwrap();
        assert_eq!(minimal.drift_time, None);
        assert_eq!(minimal.pct_drift_spread, 0.0);
    }
}
