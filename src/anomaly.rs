// SynthTS - Anomaly injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Anomaly injection into a base series.
//!
//! Two modes are provided:
//!
//! - **Pointwise**: a fraction of indices, drawn without replacement, is
//!   overwritten with values from a range wider than the series itself.
//! - **Chunked**: the series is split into blocks and each block receives one
//!   contiguous run of anomalies around its midpoint.
//!
//! The replacement range is derived from the pre-injection min/max:
//!
//! | mode      | low                      | high                    |
//! |-----------|--------------------------|-------------------------|
//! | two-sided | `-scale * (max - min)`   | `scale * (max - min)`   |
//! | one-sided | `min`                    | `scale * (max - min)`   |
//!
//! Injected values are `center + U(low, high)`, where the center is the
//! process `loc` (pointwise) or the series mean (chunked). Labeled datasets
//! use [`InjectionBounds::widened`], `[min - scale * (max - min), max + scale * (max - min)]`.
//!
//! A range that overflows `f64` is rejected as an invalid `anomaly_scale`.

use crate::error::{ensure_open_unit, ensure_positive, Result, SynthError};
use crate::series::{Series, SeriesStats};
use log::{debug, trace};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Anomaly injection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Fraction of samples to replace, in `(0, 1)`.
    pub anomaly_frac: f64,
    /// Factor applied to the series range; values above 1.0 give clear outliers.
    pub anomaly_scale: f64,
    /// Keep outliers on the high-magnitude side.
    #[serde(default)]
    pub one_sided: bool,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            anomaly_frac: 0.02,
            anomaly_scale: 1.0,
            one_sided: false,
        }
    }
}

impl AnomalyConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set anomaly fraction.
    pub fn with_frac(mut self, frac: f64) -> Self {
        self.anomaly_frac = frac;
        self
    }

    /// Set anomaly scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.anomaly_scale = scale;
        self
    }

    /// Set one-sided mode.
    pub fn with_one_sided(mut self, one_sided: bool) -> Self {
        self.one_sided = one_sided;
        self
    }

    /// Check fraction and scale ranges.
    pub fn validate(&self) -> Result<()> {
        ensure_open_unit("anomaly_frac", self.anomaly_frac)?;
        ensure_positive("anomaly_scale", self.anomaly_scale)
    }

    /// Number of anomalies for a series of `len` samples.
    pub fn count_for(&self, len: usize) -> usize {
        (len as f64 * self.anomaly_frac).floor() as usize
    }
}

/// Offset range for injected values, relative to the injection center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectionBounds {
    pub low: f64,
    pub high: f64,
}

impl InjectionBounds {
    /// Derive bounds from the statistics of the pre-injection series.
    pub fn from_stats(stats: &SeriesStats, scale: f64, one_sided: bool) -> Result<Self> {
        let spread = scale * stats.range();
        let (low, high) = if one_sided {
            (stats.min, spread)
        } else {
            (-spread, spread)
        };
        // A one-sided low above the spread is a reversed interval
        if low <= high {
            Self::finite(low, high)
        } else {
            Self::finite(high, low)
        }
    }

    /// Range covering the series itself plus `scale * (max - min)` on both sides.
    pub fn widened(stats: &SeriesStats, scale: f64) -> Result<Self> {
        let spread = scale * stats.range();
        Self::finite(stats.min - spread, stats.max + spread)
    }

    fn finite(low: f64, high: f64) -> Result<Self> {
        if low.is_finite() && high.is_finite() && (high - low).is_finite() {
            Ok(Self { low, high })
        } else {
            Err(SynthError::invalid(
                "anomaly_scale",
                format!(
                    "injection range [{}, {}] overflows for this series",
                    low, high
                ),
            ))
        }
    }

    /// Draw one offset in `[low, high)`, or `low` for a degenerate range.
    pub fn draw(&self, rng: &mut (impl Rng + ?Sized)) -> f64 {
        if self.high > self.low {
            rng.gen_range(self.low..self.high)
        } else {
            self.low
        }
    }

    /// Check whether `value` can come from these bounds around `center`.
    pub fn contains(&self, center: f64, value: f64) -> bool {
        value >= center + self.low && value <= center + self.high
    }
}

/// Result of an injection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    /// Series with anomalies written in.
    pub series: Series,
    /// Overwritten indices, ascending.
    pub indices: Vec<usize>,
    /// Value the offsets were added to.
    pub center: f64,
    /// Offset range used.
    pub bounds: InjectionBounds,
}

impl Injection {
    /// Contiguous runs of injected indices.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for &idx in &self.indices {
            match ranges.last_mut() {
                Some(last) if last.end == idx => last.end = idx + 1,
                _ => ranges.push(idx..idx + 1),
            }
        }
        ranges
    }

    /// Per-sample labels: 1 for injected, 0 otherwise.
    pub fn labels(&self) -> Vec<u8> {
        let mut labels = vec![0u8; self.series.len()];
        for &idx in &self.indices {
            labels[idx] = 1;
        }
        labels
    }

    fn untouched(series: &[f64], center: f64) -> Self {
        Self {
            series: series.to_vec(),
            indices: Vec::new(),
            center,
            bounds: InjectionBounds {
                low: 0.0,
                high: 0.0,
            },
        }
    }
}

/// Replace `floor(len * anomaly_frac)` distinct samples with outliers around `loc`.
pub fn inject_pointwise(
    series: &[f64],
    config: &AnomalyConfig,
    loc: f64,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Injection> {
    scatter(
        series,
        config,
        loc,
        |stats| InjectionBounds::from_stats(stats, config.anomaly_scale, config.one_sided),
        rng,
    )
}

/// Pointwise injection with offsets drawn from `bounds_for(stats)`.
pub(crate) fn scatter(
    series: &[f64],
    config: &AnomalyConfig,
    loc: f64,
    bounds_for: impl FnOnce(&SeriesStats) -> Result<InjectionBounds>,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Injection> {
    config.validate()?;
    let stats = match SeriesStats::of(series) {
        Some(stats) => stats,
        None => return Ok(Injection::untouched(series, loc)),
    };

    let bounds = bounds_for(&stats)?;
    let count = config.count_for(series.len());
    let mut values = series.to_vec();

    let mut indices = rand::seq::index::sample(rng, series.len(), count).into_vec();
    for &idx in &indices {
        values[idx] = loc + bounds.draw(rng);
    }
    indices.sort_unstable();

    debug!(
        "injected {} pointwise anomalies into {} samples (bounds [{:.3}, {:.3}])",
        indices.len(),
        series.len(),
        bounds.low,
        bounds.high
    );
    Ok(Injection {
        series: values,
        indices,
        center: loc,
        bounds,
    })
}

/// Inject one contiguous anomaly run into each of `num_chunks` blocks.
///
/// The output keeps the input length. Blocks have `len / num_chunks`
/// samples and the last block also takes the remainder. Each block gets
/// `total / num_chunks` anomalies, the last one also the `total % num_chunks`
/// left over, where `total = floor(len * anomaly_frac)`. A run never
/// extends past its block, so very small blocks receive fewer anomalies.
pub fn inject_chunked(
    series: &[f64],
    num_chunks: usize,
    config: &AnomalyConfig,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Injection> {
    config.validate()?;
    if num_chunks == 0 {
        return Err(SynthError::invalid(
            "num_chunks",
            "must be a positive integer",
        ));
    }
    if num_chunks > series.len() {
        return Err(SynthError::invalid(
            "num_chunks",
            format!(
                "{} chunks do not fit in a series of {} samples",
                num_chunks,
                series.len()
            ),
        ));
    }
    let stats = SeriesStats::of(series)
        .ok_or_else(|| SynthError::invalid("series", "cannot chunk an empty series"))?;

    let bounds = InjectionBounds::from_stats(&stats, config.anomaly_scale, config.one_sided)?;
    let total = config.count_for(series.len());
    let per_chunk = total / num_chunks;
    let leftover = total % num_chunks;
    let block_len = series.len() / num_chunks;

    let mut values = series.to_vec();
    let mut indices = Vec::with_capacity(total);

    for chunk in 0..num_chunks {
        let last = chunk + 1 == num_chunks;
        let block_start = chunk * block_len;
        let block_end = if last {
            series.len()
        } else {
            block_start + block_len
        };
        let size = block_end - block_start;

        let wanted = if last { per_chunk + leftover } else { per_chunk };
        let run = wanted.min(size);
        if run == 0 {
            continue;
        }

        let run_start = block_start + size / 2 - run / 2;
        for idx in run_start..run_start + run {
            values[idx] = stats.mean + bounds.draw(rng);
            indices.push(idx);
        }
        trace!(
            "chunk {} [{}, {}): anomalies at [{}, {})",
            chunk,
            block_start,
            block_end,
            run_start,
            run_start + run
        );
    }

    debug!(
        "injected {} anomalies in {} chunks into {} samples",
        indices.len(),
        num_chunks,
        series.len()
    );
    Ok(Injection {
        series: values,
        indices,
        center: stats.mean,
        bounds,
    })
}
