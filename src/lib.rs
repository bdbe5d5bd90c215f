// SynthTS - Synthetic time series generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # SynthTS
//!
//! Synthetic univariate time series for benchmarking anomaly and drift
//! detectors.
//!
//! ## Key Features
//!
//! - **Pattern composition**: Bell, funnel and cylinder segments over noise
//! - **Anomaly injection**: Pointwise or in contiguous chunks, two- or one-sided
//! - **Concept drift**: Mean shift from a chosen time on
//! - **Labeled datasets**: Mixed normal/anomalous series with 0/1 labels
//! - **Scenarios**: JSON-described generation pipelines
//!
//! ## Quick Start
//!
//! ```rust
//! use synthts::{make_rng, AnomalyConfig, DriftConfig, Stage, TimeConfig};
//!
//! let mut rng = make_rng(Some(42));
//! let axis = TimeConfig::default().axis().unwrap();
//!
//! // 144 ten-minute samples over one day
//! let normal = axis.normal_process(10.0, 1.0, &mut rng).unwrap();
//! let anomalous = normal
//!     .anomalize(&AnomalyConfig::new().with_frac(0.05), &mut rng)
//!     .unwrap();
//! let drifted = anomalous.drift(&DriftConfig::default()).unwrap();
//!
//! let frame = drifted.to_frame();
//! assert_eq!(frame.column, Stage::Drifted.column());
//! assert_eq!(frame.len(), 144);
//! ```
//!
//! ## Modules
//!
//! - [`series`]: Noise generation, statistics, seeding
//! - [`patterns`]: Shape composition
//! - [`anomaly`]: Pointwise and chunked anomaly injection
//! - [`drift`]: Concept drift
//! - [`dataset`]: Labeled datasets
//! - [`time_axis`]: Time axis and timestamp parsing
//! - [`stages`]: Staged series
//! - [`scenario`]: Config-driven generation
//! - [`frame`]: CSV/JSON export

pub mod anomaly;
pub mod dataset;
pub mod drift;
pub mod error;
pub mod frame;
pub mod patterns;
pub mod scenario;
pub mod series;
pub mod stages;
pub mod time_axis;

// Re-exports for convenient access
pub use anomaly::{inject_chunked, inject_pointwise, AnomalyConfig, Injection, InjectionBounds};
pub use dataset::{build_dataset, DatasetConfig, LabeledDataset, LabeledSeries};
pub use drift::{apply_drift, Drift, DriftConfig};
pub use error::{Result, SynthError};
pub use frame::{ExportError, FrameRow, SeriesFrame};
pub use patterns::{compose, compose_segments, PatternConfig, Shape, ShapeGenerator};
pub use scenario::{NormalConfig, ScenarioConfig, StepConfig, SyntheticTs};
pub use series::{make_rng, noise, Series, SeriesStats};
pub use stages::{AnomalousSeries, AnomalyMode, DriftedSeries, NormalSeries, Stage};
pub use time_axis::{parse_time, TimeAxis, TimeConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
