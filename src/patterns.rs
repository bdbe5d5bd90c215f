// SynthTS - Pattern composer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Pattern composition over a noise base.
//!
//! The composer fills a Gaussian noise series with randomly chosen,
//! randomly sized and randomly signed shapes. Segments are laid out left to
//! right with random gaps, so they never overlap and always end inside the
//! series.
//!
//! ```rust
//! use synthts::patterns::{compose, PatternConfig, Shape};
//! use synthts::make_rng;
//!
//! let config = PatternConfig::new()
//!     .with_length(200)
//!     .with_avg_pattern_length(10)
//!     .with_shapes(vec![Shape::Bell, Shape::Cylinder]);
//!
//! let series = compose(&config, &mut make_rng(Some(42))).unwrap();
//! assert_eq!(series.len(), 200);
//! ```

use crate::error::{Result, SynthError};
use crate::series::{gaussian, noise, Series};
use log::{debug, trace};
use rand::prelude::*;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Produces one pattern segment.
///
/// Implementors return exactly `length` samples.
pub trait ShapeGenerator {
    /// Short name for logs and segment labels.
    fn name(&self) -> &str;

    /// Generate a segment with noise of std `variance` around the shape.
    fn generate(
        &self,
        length: usize,
        amplitude: f64,
        variance: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Series>;
}

/// Built-in shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Noise plus a rising ramp `amplitude * i / length`.
    Bell,
    /// Noise plus a falling ramp `amplitude * (length - 1 - i) / length`.
    Funnel,
    /// Noise plus a constant `amplitude`.
    Cylinder,
}

impl Shape {
    /// All built-in shapes.
    pub fn all() -> Vec<Shape> {
        vec![Shape::Bell, Shape::Funnel, Shape::Cylinder]
    }

    fn offset(&self, i: usize, length: usize, amplitude: f64) -> f64 {
        match self {
            Shape::Bell => amplitude * i as f64 / length as f64,
            Shape::Funnel => amplitude * (length - 1 - i) as f64 / length as f64,
            Shape::Cylinder => amplitude,
        }
    }
}

impl ShapeGenerator for Shape {
    fn name(&self) -> &str {
        match self {
            Shape::Bell => "bell",
            Shape::Funnel => "funnel",
            Shape::Cylinder => "cylinder",
        }
    }

    fn generate(
        &self,
        length: usize,
        amplitude: f64,
        variance: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Series> {
        let mut segment = noise(length, 0.0, variance, rng)?;
        for (i, v) in segment.iter_mut().enumerate() {
            *v += self.offset(i, length, amplitude);
        }
        Ok(segment)
    }
}

/// Composer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Total series length.
    pub length: usize,
    /// Mean segment length, also the upper bound of the gap between segments.
    pub avg_pattern_length: usize,
    /// Mean segment amplitude.
    pub avg_amplitude: f64,
    /// Noise standard deviation of the base and of every segment.
    pub default_variance: f64,
    /// Standard deviation of the segment length.
    pub variance_pattern_length: f64,
    /// Standard deviation of the segment amplitude.
    pub variance_amplitude: f64,
    /// Shapes drawn uniformly for each segment.
    pub shapes: Vec<Shape>,
    /// Negate each segment with probability 1/2.
    pub include_negatives: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            length: 100,
            avg_pattern_length: 5,
            avg_amplitude: 1.0,
            default_variance: 1.0,
            variance_pattern_length: 10.0,
            variance_amplitude: 2.0,
            shapes: Shape::all(),
            include_negatives: true,
        }
    }
}

impl PatternConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set series length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set mean segment length.
    pub fn with_avg_pattern_length(mut self, avg: usize) -> Self {
        self.avg_pattern_length = avg;
        self
    }

    /// Set mean and spread of segment amplitudes.
    pub fn with_amplitude(mut self, avg: f64, variance: f64) -> Self {
        self.avg_amplitude = avg;
        self.variance_amplitude = variance;
        self
    }

    /// Set noise standard deviation.
    pub fn with_default_variance(mut self, variance: f64) -> Self {
        self.default_variance = variance;
        self
    }

    /// Set spread of segment lengths.
    pub fn with_variance_pattern_length(mut self, variance: f64) -> Self {
        self.variance_pattern_length = variance;
        self
    }

    /// Set the shape set.
    pub fn with_shapes(mut self, shapes: Vec<Shape>) -> Self {
        self.shapes = shapes;
        self
    }

    /// Enable or disable random sign flips.
    pub fn with_negatives(mut self, include: bool) -> Self {
        self.include_negatives = include;
        self
    }
}

/// A spliced segment `[start, start + length)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSegment {
    pub start: usize,
    pub length: usize,
    /// Index into the generator set used for composition.
    pub generator: usize,
    pub amplitude: f64,
    pub negated: bool,
}

impl PatternSegment {
    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Index range covered by the segment.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

/// Composed series with the segments spliced into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub series: Series,
    pub segments: Vec<PatternSegment>,
}

/// Compose a series from the configured built-in shapes.
pub fn compose<R: Rng>(config: &PatternConfig, rng: &mut R) -> Result<Series> {
    compose_segments(config, rng).map(|c| c.series)
}

/// Compose a series and keep the segment layout.
pub fn compose_segments<R: Rng>(config: &PatternConfig, rng: &mut R) -> Result<Composition> {
    let generators: Vec<&dyn ShapeGenerator> = config
        .shapes
        .iter()
        .map(|s| s as &dyn ShapeGenerator)
        .collect();
    compose_with(config, &generators, rng)
}

/// Compose a series from arbitrary shape generators.
///
/// `config.shapes` is ignored; segments draw from `generators` instead.
pub fn compose_with<R: Rng>(
    config: &PatternConfig,
    generators: &[&dyn ShapeGenerator],
    rng: &mut R,
) -> Result<Composition> {
    if generators.is_empty() {
        return Err(SynthError::invalid(
            "shapes",
            "at least one shape generator is required",
        ));
    }
    let length_dist = gaussian(
        "variance_pattern_length",
        config.avg_pattern_length as f64,
        config.variance_pattern_length,
    )?;
    let amplitude_dist = gaussian(
        "variance_amplitude",
        config.avg_amplitude,
        config.variance_amplitude,
    )?;

    let rng: &mut dyn RngCore = rng;
    let mut series = noise(config.length, 0.0, config.default_variance, rng)?;
    let mut segments = Vec::new();

    let mut start = rng.gen_range(0..=config.avg_pattern_length);
    let mut length = sample_segment_length(&length_dist, rng);

    while start.saturating_add(length) < config.length {
        let index = rng.gen_range(0..generators.len());
        let generator = generators[index];
        let amplitude = amplitude_dist.sample(rng);

        let mut pattern =
            generator.generate(length, amplitude, config.default_variance, &mut *rng)?;
        if pattern.len() != length {
            return Err(SynthError::invalid(
                "shapes",
                format!(
                    "generator '{}' returned {} samples, expected {}",
                    generator.name(),
                    pattern.len(),
                    length
                ),
            ));
        }

        let negated = config.include_negatives && rng.gen::<f64>() > 0.5;
        if negated {
            pattern.iter_mut().for_each(|v| *v = -*v);
        }

        series[start..start + length].copy_from_slice(&pattern);
        trace!(
            "spliced {} at [{}, {}) amplitude={:.3} negated={}",
            generator.name(),
            start,
            start + length,
            amplitude,
            negated
        );
        segments.push(PatternSegment {
            start,
            length,
            generator: index,
            amplitude,
            negated,
        });

        start += length + rng.gen_range(0..=config.avg_pattern_length);
        length = sample_segment_length(&length_dist, rng);
    }

    debug!(
        "composed series of {} samples with {} segments",
        series.len(),
        segments.len()
    );
    Ok(Composition { series, segments })
}

/// `max(1, ceil(N(avg, variance)))`.
fn sample_segment_length(dist: &Normal<f64>, rng: &mut dyn RngCore) -> usize {
    let raw = dist.sample(rng).ceil();
    if raw < 1.0 {
        1
    } else {
        raw as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::make_rng;
    use approx::assert_relative_eq;

    fn quiet_config(shape: Shape) -> PatternConfig {
        PatternConfig::new()
            .with_default_variance(0.0)
            .with_shapes(vec![shape])
            .with_negatives(false)
    }

    #[test]
    fn test_length_preserved() {
        for length in [0, 1, 7, 100, 1000] {
            let config = PatternConfig::new().with_length(length);
            let series = compose(&config, &mut make_rng(Some(3))).unwrap();
            assert_eq!(series.len(), length);
        }
    }

    #[test]
    fn test_single_shape_splices_segments() {
        let config = PatternConfig::new()
            .with_length(100)
            .with_avg_pattern_length(5)
            .with_shapes(vec![Shape::Cylinder]);
        let composition = compose_segments(&config, &mut make_rng(Some(42))).unwrap();

        assert_eq!(composition.series.len(), 100);
        assert!(!composition.segments.is_empty());
        assert!(composition.segments.iter().all(|s| s.generator == 0));
    }

    #[test]
    fn test_segments_ordered_and_in_bounds() {
        let config = PatternConfig::new().with_length(500).with_avg_pattern_length(8);
        let composition = compose_segments(&config, &mut make_rng(Some(9))).unwrap();

        let mut previous_end = 0;
        for segment in &composition.segments {
            assert!(segment.length >= 1);
            assert!(segment.start >= previous_end);
            assert!(segment.end() < 500);
            previous_end = segment.end();
        }
    }

    #[test]
    fn test_cylinder_values_without_noise() {
        let config = quiet_config(Shape::Cylinder).with_length(300);
        let composition = compose_segments(&config, &mut make_rng(Some(5))).unwrap();

        let mut covered = vec![false; 300];
        for segment in &composition.segments {
            for i in segment.range() {
                assert_relative_eq!(composition.series[i], segment.amplitude);
                covered[i] = true;
            }
        }
        for (i, v) in composition.series.iter().enumerate() {
            if !covered[i] {
                assert_eq!(*v, 0.0);
            }
        }
    }

    #[test]
    fn test_bell_and_funnel_ramps() {
        let mut rng = make_rng(Some(1));
        let bell = Shape::Bell.generate(4, 2.0, 0.0, &mut rng).unwrap();
        assert_eq!(bell, vec![0.0, 0.5, 1.0, 1.5]);

        let funnel = Shape::Funnel.generate(4, 2.0, 0.0, &mut rng).unwrap();
        assert_eq!(funnel, vec![1.5, 1.0, 0.5, 0.0]);

        let cylinder = Shape::Cylinder.generate(3, -1.0, 0.0, &mut rng).unwrap();
        assert_eq!(cylinder, vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_negation_flips_sign() {
        let config = PatternConfig::new()
            .with_length(2000)
            .with_default_variance(0.0)
            .with_amplitude(5.0, 0.0)
            .with_shapes(vec![Shape::Cylinder]);
        let composition = compose_segments(&config, &mut make_rng(Some(11))).unwrap();

        assert!(composition.segments.iter().any(|s| s.negated));
        assert!(composition.segments.iter().any(|s| !s.negated));
        for segment in &composition.segments {
            let expected = if segment.negated { -5.0 } else { 5.0 };
            assert_eq!(composition.series[segment.start], expected);
        }
    }

    #[test]
    fn test_too_short_is_pure_noise() {
        let config = PatternConfig::new().with_length(1);
        let composition = compose_segments(&config, &mut make_rng(Some(2))).unwrap();
        assert_eq!(composition.series.len(), 1);
        assert!(composition.segments.is_empty());
    }

    #[test]
    fn test_reproducible() {
        let config = PatternConfig::new().with_length(250);
        let a = compose(&config, &mut make_rng(Some(77))).unwrap();
        let b = compose(&config, &mut make_rng(Some(77))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config() {
        let mut rng = make_rng(Some(0));
        let empty = PatternConfig::new().with_shapes(Vec::new());
        assert!(matches!(
            compose(&empty, &mut rng),
            Err(SynthError::InvalidParameter { name: "shapes", .. })
        ));

        let negative = PatternConfig::new().with_default_variance(-1.0);
        assert!(compose(&negative, &mut rng).is_err());

        let negative = PatternConfig::new().with_variance_pattern_length(-1.0);
        assert!(matches!(
            compose(&negative, &mut rng),
            Err(SynthError::InvalidParameter {
                name: "variance_pattern_length",
                ..
            })
        ));
    }

    #[test]
    fn test_fixed_segment_length() {
        let config = PatternConfig::new()
            .with_length(400)
            .with_avg_pattern_length(8)
            .with_variance_pattern_length(0.0);
        let composition = compose_segments(&config, &mut make_rng(Some(17))).unwrap();

        assert!(!composition.segments.is_empty());
        assert!(composition.segments.iter().all(|s| s.length == 8));
    }

    struct Spike;

    impl ShapeGenerator for Spike {
        fn name(&self) -> &str {
            "spike"
        }

        fn generate(
            &self,
            length: usize,
            amplitude: f64,
            _variance: f64,
            _rng: &mut dyn RngCore,
        ) -> Result<Series> {
            let mut segment = vec![0.0; length];
            segment[length / 2] = amplitude;
            Ok(segment)
        }
    }

    #[test]
    fn test_custom_generator() {
        let config = PatternConfig::new()
            .with_length(400)
            .with_default_variance(0.0)
            .with_negatives(false);
        let spike = Spike;
        let composition = compose_with(&config, &[&spike], &mut make_rng(Some(4))).unwrap();

        assert!(!composition.segments.is_empty());
        for segment in &composition.segments {
            let peak = segment.start + segment.length / 2;
            assert_eq!(composition.series[peak], segment.amplitude);
        }
    }
}
