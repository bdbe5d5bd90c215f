// SynthTS - Labeled datasets
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Labeled collections of normal and anomalous series.
//!
//! Each row is an independent noise series. With probability
//! `prob_anomalous` it receives pointwise anomalies and label `1`,
//! otherwise it stays pure noise with label `0`. Anomalous samples are
//! `loc + U(min - s * r, max + s * r)` with `r = max - min` of the row's
//! noise, so they may also land inside the normal range.
//!
//! ```rust
//! use synthts::dataset::{build_dataset, DatasetConfig};
//! use synthts::make_rng;
//!
//! let config = DatasetConfig::new().with_n(20).with_size(200);
//! let dataset = build_dataset(&config, &mut make_rng(Some(42))).unwrap();
//!
//! assert_eq!(dataset.len(), 20);
//! ```

use crate::anomaly::{scatter, AnomalyConfig, Injection, InjectionBounds};
use crate::error::{ensure_std_dev, Result, SynthError};
use crate::frame::ExportError;
use crate::series::{noise, Series};
use log::debug;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Dataset generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Number of series.
    pub n: usize,
    /// Probability that a series is anomalous, below 1.0.
    pub prob_anomalous: f64,
    /// Samples per series.
    pub size: usize,
    /// Fraction of anomalous samples in an anomalous series.
    pub anomaly_frac: f64,
    /// Anomaly scale factor.
    pub anomaly_scale: f64,
    /// Mean of the noise process.
    pub loc: f64,
    /// Standard deviation of the noise process.
    pub scale: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            n: 10,
            prob_anomalous: 0.1,
            size: 1000,
            anomaly_frac: 0.02,
            anomaly_scale: 2.0,
            loc: 0.0,
            scale: 1.0,
        }
    }
}

impl DatasetConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of series.
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Set probability of an anomalous series.
    pub fn with_prob_anomalous(mut self, prob: f64) -> Self {
        self.prob_anomalous = prob;
        self
    }

    /// Set samples per series.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set anomaly fraction and scale.
    pub fn with_anomalies(mut self, frac: f64, scale: f64) -> Self {
        self.anomaly_frac = frac;
        self.anomaly_scale = scale;
        self
    }

    /// Set noise parameters.
    pub fn with_noise(mut self, loc: f64, scale: f64) -> Self {
        self.loc = loc;
        self.scale = scale;
        self
    }

    /// Injection settings for anomalous rows.
    pub fn anomaly_config(&self) -> AnomalyConfig {
        AnomalyConfig::new()
            .with_frac(self.anomaly_frac)
            .with_scale(self.anomaly_scale)
    }

    /// Check all parameters before generation.
    pub fn validate(&self) -> Result<()> {
        if self.prob_anomalous.is_nan() || self.prob_anomalous >= 1.0 {
            return Err(SynthError::invalid(
                "prob_anomalous",
                format!(
                    "probability of anomaly cannot be equal to or greater than 1.0, got {}",
                    self.prob_anomalous
                ),
            ));
        }
        ensure_std_dev("scale", self.scale)?;
        self.anomaly_config().validate()
    }
}

/// One dataset row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub series: Series,
    /// 1 for anomalous, 0 for normal.
    pub label: u8,
    /// Injected indices of an anomalous row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomaly_indices: Vec<usize>,
}

impl LabeledSeries {
    pub fn is_anomalous(&self) -> bool {
        self.label == 1
    }
}

/// Table of `(series, label)` rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub rows: Vec<LabeledSeries>,
}

impl LabeledDataset {
    /// Get all rows.
    pub fn rows(&self) -> &[LabeledSeries] {
        &self.rows
    }

    /// Get number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Label column.
    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Number of anomalous rows.
    pub fn anomalous_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_anomalous()).count()
    }

    /// Export to JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> std::result::Result<(), ExportError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Import from JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> std::result::Result<Self, ExportError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Noise series `N(loc, scale)` of `size` samples with pointwise anomalies
/// drawn from the widened range.
pub fn anomalous_series(
    size: usize,
    config: &AnomalyConfig,
    loc: f64,
    scale: f64,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Injection> {
    config.validate()?;
    let base = noise(size, loc, scale, rng)?;
    scatter(
        &base,
        config,
        loc,
        |stats| InjectionBounds::widened(stats, config.anomaly_scale),
        rng,
    )
}

/// Build a labeled dataset.
pub fn build_dataset(config: &DatasetConfig, rng: &mut (impl Rng + ?Sized)) -> Result<LabeledDataset> {
    config.validate()?;
    let anomaly = config.anomaly_config();

    let mut rows = Vec::with_capacity(config.n);
    for _ in 0..config.n {
        let row = if rng.gen::<f64>() < config.prob_anomalous {
            let injection = anomalous_series(config.size, &anomaly, config.loc, config.scale, rng)?;
            LabeledSeries {
                series: injection.series,
                label: 1,
                anomaly_indices: injection.indices,
            }
        } else {
            LabeledSeries {
                series: noise(config.size, config.loc, config.scale, rng)?,
                label: 0,
                anomaly_indices: Vec::new(),
            }
        };
        rows.push(row);
    }

    let dataset = LabeledDataset { rows };
    debug!(
        "built dataset of {} series ({} anomalous)",
        dataset.len(),
        dataset.anomalous_count()
    );
    Ok(dataset)
}
