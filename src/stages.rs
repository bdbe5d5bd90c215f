// SynthTS - Staged series
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generation stages as types.
//!
//! Each stage is produced from the previous one, so the order
//! normal process -> anomaly injection -> drift is checked by the compiler:
//!
//! ```rust
//! use synthts::{make_rng, AnomalyConfig, DriftConfig, TimeConfig};
//!
//! let mut rng = make_rng(Some(42));
//! let axis = TimeConfig::default().axis().unwrap();
//!
//! let normal = axis.normal_process(0.0, 1.0, &mut rng).unwrap();
//! let anomalous = normal
//!     .anomalize(&AnomalyConfig::new().with_scale(2.0), &mut rng)
//!     .unwrap();
//! let drifted = anomalous.drift(&DriftConfig::default()).unwrap();
//!
//! assert_eq!(drifted.values().len(), axis.len());
//! ```

use crate::anomaly::{inject_chunked, inject_pointwise, AnomalyConfig, Injection};
use crate::drift::{apply_drift, Drift, DriftConfig};
use crate::error::{Result, SynthError};
use crate::frame::SeriesFrame;
use crate::patterns::{compose_segments, PatternConfig, PatternSegment};
use crate::series::{noise, Series};
use crate::time_axis::TimeAxis;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Base process generated.
    Normal,
    /// Anomalies injected.
    Anomalized,
    /// Drift applied.
    Drifted,
}

impl Stage {
    /// Column name used in frames.
    pub fn column(&self) -> &'static str {
        match self {
            Stage::Normal => "normal_data",
            Stage::Anomalized => "anomaly_data",
            Stage::Drifted => "drifted_data",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normal => "normal process",
            Stage::Anomalized => "anomaly injection",
            Stage::Drifted => "drift",
        };
        f.write_str(name)
    }
}

/// How anomalies were injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnomalyMode {
    Pointwise,
    Chunked { num_chunks: usize },
}

/// Base process over a time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalSeries {
    axis: TimeAxis,
    loc: f64,
    values: Series,
    segments: Vec<PatternSegment>,
}

impl NormalSeries {
    /// Gaussian process `N(loc, scale)`, one sample per axis step.
    pub fn generate(
        axis: &TimeAxis,
        loc: f64,
        scale: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<Self> {
        let values = noise(axis.len(), loc, scale, rng)?;
        Ok(Self {
            axis: axis.clone(),
            loc,
            values,
            segments: Vec::new(),
        })
    }

    /// Pattern composition over the axis; `config.length` is taken from the axis.
    pub fn from_patterns<R: Rng>(axis: &TimeAxis, config: &PatternConfig, rng: &mut R) -> Result<Self> {
        let config = config.clone().with_length(axis.len());
        let composition = compose_segments(&config, rng)?;
        Ok(Self {
            axis: axis.clone(),
            loc: 0.0,
            values: composition.series,
            segments: composition.segments,
        })
    }

    /// Wrap existing values as a base process centred on `loc`.
    pub fn from_values(axis: &TimeAxis, loc: f64, values: Series) -> Result<Self> {
        if values.len() != axis.len() {
            return Err(SynthError::invalid(
                "values",
                format!(
                    "has {} samples but the time axis has {}",
                    values.len(),
                    axis.len()
                ),
            ));
        }
        Ok(Self {
            axis: axis.clone(),
            loc,
            values,
            segments: Vec::new(),
        })
    }

    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    /// Process mean used as the pointwise injection center.
    pub fn loc(&self) -> f64 {
        self.loc
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Pattern segments, empty for a noise process.
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Pointwise anomaly injection.
    pub fn anomalize(
        &self,
        config: &AnomalyConfig,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<AnomalousSeries> {
        let injection = inject_pointwise(&self.values, config, self.loc, rng)?;
        Ok(AnomalousSeries {
            axis: self.axis.clone(),
            mode: AnomalyMode::Pointwise,
            injection,
        })
    }

    /// Chunked anomaly injection.
    pub fn chunk_anomalize(
        &self,
        num_chunks: usize,
        config: &AnomalyConfig,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<AnomalousSeries> {
        let injection = inject_chunked(&self.values, num_chunks, config, rng)?;
        Ok(AnomalousSeries {
            axis: self.axis.clone(),
            mode: AnomalyMode::Chunked { num_chunks },
            injection,
        })
    }

    pub fn to_frame(&self) -> SeriesFrame {
        SeriesFrame::zip(Stage::Normal.column(), &self.axis, &self.values)
    }
}

/// Base process with anomalies.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalousSeries {
    axis: TimeAxis,
    mode: AnomalyMode,
    injection: Injection,
}

impl AnomalousSeries {
    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    pub fn mode(&self) -> AnomalyMode {
        self.mode
    }

    pub fn values(&self) -> &[f64] {
        &self.injection.series
    }

    /// Injected indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.injection.indices
    }

    /// Per-sample anomaly labels.
    pub fn labels(&self) -> Vec<u8> {
        self.injection.labels()
    }

    pub fn injection(&self) -> &Injection {
        &self.injection
    }

    /// Apply drift on top of the anomalies.
    pub fn drift(&self, config: &DriftConfig) -> Result<DriftedSeries> {
        let drift = apply_drift(&self.injection.series, &self.axis, config)?;
        Ok(DriftedSeries {
            axis: self.axis.clone(),
            labels: self.labels(),
            drift,
        })
    }

    pub fn to_frame(&self) -> SeriesFrame {
        SeriesFrame::zip(Stage::Anomalized.column(), &self.axis, self.values())
    }
}

/// Anomalous series with drift applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftedSeries {
    axis: TimeAxis,
    labels: Vec<u8>,
    drift: Drift,
}

impl DriftedSeries {
    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    pub fn values(&self) -> &[f64] {
        &self.drift.series
    }

    /// First drifted sample.
    pub fn drift_index(&self) -> usize {
        self.drift.drift_index
    }

    /// Shift applied from the drift index on.
    pub fn offset(&self) -> f64 {
        self.drift.offset
    }

    /// Anomaly labels carried over from the injection stage.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn to_frame(&self) -> SeriesFrame {
        SeriesFrame::zip(Stage::Drifted.column(), &self.axis, self.values())
    }
}

impl TimeAxis {
    /// Gaussian base process over this axis.
    pub fn normal_process(
        &self,
        loc: f64,
        scale: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<NormalSeries> {
        NormalSeries::generate(self, loc, scale, rng)
    }
}
