// SynthTS - Series primitives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Series type, Gaussian noise and summary statistics.

use crate::error::{ensure_std_dev, Result, SynthError};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// One time series: ordered samples of fixed length.
pub type Series = Vec<f64>;

/// Create the random source for a generation run.
///
/// A seed makes every generator reproducible; `None` draws from entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Build a Gaussian distribution, rejecting invalid spreads.
pub(crate) fn gaussian(name: &'static str, mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    ensure_std_dev(name, std_dev)?;
    Normal::new(mean, std_dev).map_err(|e| SynthError::invalid(name, e.to_string()))
}

/// Gaussian noise `N(loc, scale)` of `len` samples.
pub fn noise(len: usize, loc: f64, scale: f64, rng: &mut (impl Rng + ?Sized)) -> Result<Series> {
    let dist = gaussian("scale", loc, scale)?;
    Ok((0..len).map(|_| dist.sample(rng)).collect())
}

/// Basic statistics of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    /// Compute statistics, `None` for an empty series.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }

    /// Spread between extremes.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}
