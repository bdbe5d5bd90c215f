// SynthTS - Scenarios
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Config-driven generation.
//!
//! A scenario lists generation steps in order. Steps run against a
//! [`SyntheticTs`], which keeps the latest output of every stage. Since the
//! step list comes from a file, the stage order is only known at run time:
//! a step whose predecessor has not run fails with
//! [`SynthError::PrecedenceViolation`] and leaves the state untouched.
//!
//! ```json
//! {
//!   "name": "drifting_spikes",
//!   "seed": 42,
//!   "time": {
//!     "start_time": "2021-01-01 00:00:00",
//!     "end_time": "2021-01-02 00:00:00",
//!     "process_time_mins": 10.0
//!   },
//!   "steps": [
//!     { "type": "normal", "loc": 0.0, "scale": 1.0 },
//!     { "type": "anomalize", "anomaly_frac": 0.05, "anomaly_scale": 2.0 },
//!     { "type": "drift", "pct_drift_mean": 20.0 }
//!   ]
//! }
//! ```

use crate::anomaly::AnomalyConfig;
use crate::drift::DriftConfig;
use crate::error::{Result, SynthError};
use crate::frame::SeriesFrame;
use crate::patterns::PatternConfig;
use crate::series::make_rng;
use crate::stages::{AnomalousSeries, DriftedSeries, NormalSeries, Stage};
use crate::time_axis::{TimeAxis, TimeConfig};
use log::{debug, info};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Base process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalConfig {
    /// Mean of the Gaussian process.
    #[serde(default)]
    pub loc: f64,
    /// Standard deviation of the Gaussian process.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Compose patterns instead of plain noise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternConfig>,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            loc: 0.0,
            scale: default_scale(),
            patterns: None,
        }
    }
}

/// One generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    /// Generate the base process.
    Normal(NormalConfig),
    /// Pointwise anomalies on the base process.
    Anomalize(AnomalyConfig),
    /// Chunked anomalies on the base process.
    ChunkAnomalize {
        num_chunks: usize,
        anomaly_frac: f64,
        anomaly_scale: f64,
        #[serde(default)]
        one_sided: bool,
    },
    /// Drift on the anomalous series.
    Drift(DriftConfig),
}

impl StepConfig {
    /// Stage produced by this step.
    pub fn stage(&self) -> Stage {
        match self {
            StepConfig::Normal(_) => Stage::Normal,
            StepConfig::Anomalize(_) | StepConfig::ChunkAnomalize { .. } => Stage::Anomalized,
            StepConfig::Drift(_) => Stage::Drifted,
        }
    }
}

/// Stage that must have run before `stage`.
fn prerequisite(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Normal => None,
        Stage::Anomalized => Some(Stage::Normal),
        Stage::Drifted => Some(Stage::Anomalized),
    }
}

/// Scenario definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Random seed for reproducibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Time axis.
    #[serde(default)]
    pub time: TimeConfig,
    /// Steps, run in order.
    pub steps: Vec<StepConfig>,
}

impl ScenarioConfig {
    /// Create an empty scenario.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            seed: None,
            time: TimeConfig::default(),
            steps: Vec::new(),
        }
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set time axis.
    pub fn with_time(mut self, time: TimeConfig) -> Self {
        self.time = time;
        self
    }

    /// Set description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append a step.
    pub fn add_step(mut self, step: StepConfig) -> Self {
        self.steps.push(step);
        self
    }

    /// Load scenario from JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::result::Result<Self, std::io::Error> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save scenario to JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> std::result::Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    /// Check step order without generating anything.
    pub fn check_order(&self) -> Result<()> {
        let mut done: Vec<Stage> = Vec::new();
        for step in &self.steps {
            let stage = step.stage();
            if let Some(requires) = prerequisite(stage) {
                if !done.contains(&requires) {
                    return Err(SynthError::PrecedenceViolation { stage, requires });
                }
            }
            done.push(stage);
        }
        Ok(())
    }

    /// Run all steps with the scenario seed.
    pub fn run(&self) -> Result<SyntheticTs> {
        self.run_with(&mut make_rng(self.seed))
    }

    /// Run all steps with the given random source.
    pub fn run_with<R: Rng>(&self, rng: &mut R) -> Result<SyntheticTs> {
        self.check_order()?;
        let mut ts = SyntheticTs::new(self.time.axis()?);
        for step in &self.steps {
            ts.run_step(step, rng)?;
        }
        info!(
            "scenario '{}' finished at stage {:?} ({} samples)",
            self.name,
            ts.stage(),
            ts.axis().len()
        );
        Ok(ts)
    }

    /// Noise with 2% pointwise anomalies.
    pub fn point_anomalies() -> Self {
        Self::new("point_anomalies")
            .with_description("Gaussian noise with scattered two-sided outliers")
            .add_step(StepConfig::Normal(NormalConfig::default()))
            .add_step(StepConfig::Anomalize(
                AnomalyConfig::new().with_frac(0.02).with_scale(2.0),
            ))
    }

    /// Noise with two contiguous anomaly chunks.
    pub fn chunked_anomalies() -> Self {
        Self::new("chunked_anomalies")
            .with_description("Gaussian noise with two one-sided anomaly bursts")
            .add_step(StepConfig::Normal(NormalConfig::default()))
            .add_step(StepConfig::ChunkAnomalize {
                num_chunks: 2,
                anomaly_frac: 0.1,
                anomaly_scale: 1.5,
                one_sided: true,
            })
    }

    /// Noise with anomalies and a 20% mean drift at midday.
    pub fn mean_drift() -> Self {
        Self::new("mean_drift")
            .with_description("Gaussian noise around 10.0 with anomalies, drifting by 20% at midpoint")
            .add_step(StepConfig::Normal(NormalConfig {
                loc: 10.0,
                ..Default::default()
            }))
            .add_step(StepConfig::Anomalize(AnomalyConfig::new().with_scale(2.0)))
            .add_step(StepConfig::Drift(DriftConfig::default()))
    }
}

/// Generator state: the latest output of every stage.
///
/// A stage's output stays available once produced. Rerunning a stage
/// replaces its own output only.
#[derive(Debug, Clone)]
pub struct SyntheticTs {
    axis: TimeAxis,
    normal: Option<NormalSeries>,
    anomalous: Option<AnomalousSeries>,
    drifted: Option<DriftedSeries>,
}

impl SyntheticTs {
    /// Create a generator with no stage run.
    pub fn new(axis: TimeAxis) -> Self {
        Self {
            axis,
            normal: None,
            anomalous: None,
            drifted: None,
        }
    }

    /// Create a generator from time settings.
    pub fn from_config(time: &TimeConfig) -> Result<Self> {
        Ok(Self::new(time.axis()?))
    }

    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    /// Generate the Gaussian base process.
    pub fn normal_process(
        &mut self,
        loc: f64,
        scale: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<&NormalSeries> {
        let normal = self.axis.normal_process(loc, scale, rng)?;
        Ok(self.normal.insert(normal))
    }

    /// Generate a pattern-composed base process.
    pub fn pattern_process<R: Rng>(
        &mut self,
        config: &PatternConfig,
        rng: &mut R,
    ) -> Result<&NormalSeries> {
        let normal = NormalSeries::from_patterns(&self.axis, config, rng)?;
        Ok(self.normal.insert(normal))
    }

    /// Pointwise anomalies on the base process.
    pub fn anomalize(
        &mut self,
        config: &AnomalyConfig,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<&AnomalousSeries> {
        let anomalous = self.require_normal()?.anomalize(config, rng)?;
        Ok(self.anomalous.insert(anomalous))
    }

    /// Chunked anomalies on the base process.
    pub fn chunk_anomalize(
        &mut self,
        num_chunks: usize,
        config: &AnomalyConfig,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<&AnomalousSeries> {
        let anomalous = self
            .require_normal()?
            .chunk_anomalize(num_chunks, config, rng)?;
        Ok(self.anomalous.insert(anomalous))
    }

    /// Drift on the latest anomalous series.
    pub fn drift(&mut self, config: &DriftConfig) -> Result<&DriftedSeries> {
        let anomalous = self
            .anomalous
            .as_ref()
            .ok_or(SynthError::PrecedenceViolation {
                stage: Stage::Drifted,
                requires: Stage::Anomalized,
            })?;
        let drifted = anomalous.drift(config)?;
        Ok(self.drifted.insert(drifted))
    }

    /// Run one configured step.
    pub fn run_step<R: Rng>(&mut self, step: &StepConfig, rng: &mut R) -> Result<Stage> {
        match step {
            StepConfig::Normal(normal) => match &normal.patterns {
                Some(patterns) => self.pattern_process(patterns, rng).map(|_| ())?,
                None => self.normal_process(normal.loc, normal.scale, rng).map(|_| ())?,
            },
            StepConfig::Anomalize(config) => self.anomalize(config, rng).map(|_| ())?,
            StepConfig::ChunkAnomalize {
                num_chunks,
                anomaly_frac,
                anomaly_scale,
                one_sided,
            } => {
                let config = AnomalyConfig::new()
                    .with_frac(*anomaly_frac)
                    .with_scale(*anomaly_scale)
                    .with_one_sided(*one_sided);
                self.chunk_anomalize(*num_chunks, &config, rng).map(|_| ())?
            }
            StepConfig::Drift(config) => self.drift(config).map(|_| ())?,
        }
        debug!("step {} done", step.stage());
        Ok(step.stage())
    }

    /// Check whether a stage has produced output.
    pub fn has_run(&self, stage: Stage) -> bool {
        match stage {
            Stage::Normal => self.normal.is_some(),
            Stage::Anomalized => self.anomalous.is_some(),
            Stage::Drifted => self.drifted.is_some(),
        }
    }

    /// Furthest stage that has run.
    pub fn stage(&self) -> Option<Stage> {
        [Stage::Drifted, Stage::Anomalized, Stage::Normal]
            .into_iter()
            .find(|s| self.has_run(*s))
    }

    pub fn normal(&self) -> Option<&NormalSeries> {
        self.normal.as_ref()
    }

    pub fn anomalous(&self) -> Option<&AnomalousSeries> {
        self.anomalous.as_ref()
    }

    pub fn drifted(&self) -> Option<&DriftedSeries> {
        self.drifted.as_ref()
    }

    /// Tabular output of a stage, `None` if it has not run.
    pub fn frame(&self, stage: Stage) -> Option<SeriesFrame> {
        match stage {
            Stage::Normal => self.normal.as_ref().map(NormalSeries::to_frame),
            Stage::Anomalized => self.anomalous.as_ref().map(AnomalousSeries::to_frame),
            Stage::Drifted => self.drifted.as_ref().map(DriftedSeries::to_frame),
        }
    }

    fn require_normal(&self) -> Result<&NormalSeries> {
        self.normal.as_ref().ok_or(SynthError::PrecedenceViolation {
            stage: Stage::Anomalized,
            requires: Stage::Normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn generator() -> SyntheticTs {
        SyntheticTs::from_config(&TimeConfig::default()).unwrap()
    }

    #[test]
    fn test_fresh_state() {
        let ts = generator();
        assert_eq!(ts.stage(), None);
        assert!(!ts.has_run(Stage::Normal));
        assert!(ts.frame(Stage::Normal).is_none());
    }

    #[test]
    fn test_anomalize_before_normal() {
        let mut ts = generator();
        let mut rng = make_rng(Some(1));
        let err = ts.anomalize(&AnomalyConfig::new(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            SynthError::PrecedenceViolation {
                stage: Stage::Anomalized,
                requires: Stage::Normal,
            }
        );
        assert!(ts
            .chunk_anomalize(2, &AnomalyConfig::new(), &mut rng)
            .is_err());
        assert_eq!(ts.stage(), None);
    }

    #[test]
    fn test_drift_before_anomalize() {
        let mut ts = generator();
        let mut rng = make_rng(Some(2));
        ts.normal_process(0.0, 1.0, &mut rng).unwrap();

        let err = ts.drift(&DriftConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SynthError::PrecedenceViolation {
                stage: Stage::Drifted,
                requires: Stage::Anomalized,
            }
        ));
        assert_eq!(ts.stage(), Some(Stage::Normal));
    }

    #[test]
    fn test_failed_step_keeps_state() {
        let mut ts = generator();
        let mut rng = make_rng(Some(3));
        ts.normal_process(0.0, 1.0, &mut rng).unwrap();
        let first = ts.anomalize(&AnomalyConfig::new(), &mut rng).unwrap().clone();

        let bad = AnomalyConfig::new().with_frac(1.0);
        assert!(ts.anomalize(&bad, &mut rng).is_err());
        assert_eq!(ts.anomalous(), Some(&first));
    }

    #[test]
    fn test_full_run() {
        let mut ts = generator();
        let mut rng = make_rng(Some(4));
        ts.normal_process(5.0, 1.0, &mut rng).unwrap();
        ts.anomalize(&AnomalyConfig::new(), &mut rng).unwrap();
        ts.drift(&DriftConfig::default()).unwrap();

        assert_eq!(ts.stage(), Some(Stage::Drifted));
        for stage in [Stage::Normal, Stage::Anomalized, Stage::Drifted] {
            let frame = ts.frame(stage).unwrap();
            assert_eq!(frame.column, stage.column());
            assert_eq!(frame.len(), 144);
        }
    }

    #[test]
    fn test_check_order() {
        let ok = ScenarioConfig::mean_drift();
        assert!(ok.check_order().is_ok());

        let bad = ScenarioConfig::new("bad")
            .add_step(StepConfig::Normal(NormalConfig::default()))
            .add_step(StepConfig::Drift(DriftConfig::default()));
        assert!(matches!(
            bad.check_order(),
            Err(SynthError::PrecedenceViolation {
                stage: Stage::Drifted,
                requires: Stage::Anomalized,
            })
        ));
        assert!(bad.run().is_err());
    }

    #[test]
    fn test_presets_run() {
        for scenario in [
            ScenarioConfig::point_anomalies(),
            ScenarioConfig::chunked_anomalies(),
            ScenarioConfig::mean_drift(),
        ] {
            let ts = scenario.with_seed(7).run().unwrap();
            assert!(ts.has_run(Stage::Anomalized));
        }
    }

    #[test]
    fn test_seeded_scenario_reproducible() {
        let scenario = ScenarioConfig::mean_drift().with_seed(99);
        let a = scenario.run().unwrap();
        let b = scenario.run().unwrap();
        assert_eq!(
            a.drifted().unwrap().values(),
            b.drifted().unwrap().values()
        );
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "name": "drifting_spikes",
            "seed": 42,
            "time": {
                "start_time": "2021-01-01 00:00:00",
                "end_time": "2021-01-01 12:00:00",
                "process_time_mins": 5.0
            },
            "steps": [
                { "type": "normal", "loc": 1.0 },
                { "type": "chunk_anomalize", "num_chunks": 3, "anomaly_frac": 0.1, "anomaly_scale": 2.0 },
                { "type": "drift", "pct_drift_mean": 10.0, "drift_time": "2021-01-01 09:00:00" }
            ]
        }"#;
        let scenario: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(
            scenario.steps[0],
            StepConfig::Normal(NormalConfig {
                loc: 1.0,
                scale: 1.0,
                patterns: None,
            })
        );

        let ts = scenario.run().unwrap();
        assert_eq!(ts.axis().len(), 144);
        assert_eq!(ts.drifted().unwrap().drift_index(), 108);
    }

    #[test]
    fn test_json_file_roundtrip() {
        let scenario = ScenarioConfig::chunked_anomalies().with_seed(5);
        let temp_file = NamedTempFile::new().unwrap();
        scenario.to_json_file(temp_file.path()).unwrap();

        let loaded = ScenarioConfig::from_json_file(temp_file.path()).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_pattern_step() {
        let scenario = ScenarioConfig::new("patterns")
            .with_seed(12)
            .add_step(StepConfig::Normal(NormalConfig {
                patterns: Some(PatternConfig::default()),
                ..Default::default()
            }))
            .add_step(StepConfig::Anomalize(AnomalyConfig::new()));
        let ts = scenario.run().unwrap();
        assert!(!ts.normal().unwrap().segments().is_empty());
    }
}
