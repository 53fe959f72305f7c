//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded shots on disk, loads them through the
//! oscilloscope CSV reader, parses optional expectation JSON placed next to
//! each recording (`<name>.expect.json`) and compares computed results
//! against those expectations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::calibration::GaugeFactorResult;
use crate::config::RecordingConfig;
use crate::recording::{load_csv, SignalRecord};

/// Default location for fixture CSV/JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub csv_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture recording.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub record: SignalRecord,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    #[serde(default)]
    pub notes: Option<String>,
    /// Channel the expectation applies to; None means any
    #[serde(default)]
    pub channel: Option<usize>,
    pub gauge_factor: f64,
    pub wave_speed_m_s: f64,
    #[serde(default)]
    pub tolerance: Tolerance,
}

/// Absolute tolerances for expectation checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tolerance {
    pub gauge_factor: f64,
    pub wave_speed_m_s: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            gauge_factor: 0.5,
            wave_speed_m_s: 1.0,
        }
    }
}

impl FixtureExpectations {
    /// Whether these expectations were written for `channel`
    pub fn applies_to(&self, channel: usize) -> bool {
        self.channel.map_or(true, |expected| expected == channel)
    }

    pub fn verify(&self, actual: &GaugeFactorResult) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        let checks = [
            (
                "gauge_factor",
                self.gauge_factor,
                actual.gauge_factor,
                self.tolerance.gauge_factor,
            ),
            (
                "wave_speed_m_s",
                self.wave_speed_m_s,
                actual.wave_speed_m_s,
                self.tolerance.wave_speed_m_s,
            ),
        ];

        for (quantity, expected, value, tolerance) in checks {
            let delta = (value - expected).abs();
            if !(delta <= tolerance) {
                failures.push(ExpectationFailure {
                    quantity,
                    expected,
                    actual: value,
                    tolerance,
                    delta,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "quantity": failure.quantity,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "tolerance": failure.tolerance,
                    "delta": failure.delta,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single quantity.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub quantity: &'static str,
    pub expected: f64,
    pub actual: f64,
    pub tolerance: f64,
    pub delta: f64,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
    recording: RecordingConfig,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            recording: RecordingConfig::default(),
        }
    }

    pub fn with_recording_config(mut self, recording: RecordingConfig) -> Self {
        self.recording = recording;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some("csv") {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture recording + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let csv_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&csv_path)?;
        let record = load_csv(&csv_path, &self.recording)
            .with_context(|| format!("loading {}", csv_path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => Some(load_expectations(&path)?),
            None => None,
        };

        Ok(FixtureData {
            metadata,
            record,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.csv"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, csv_path: &Path) -> Result<FixtureMetadata> {
        let name = csv_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", csv_path.display()))?
            .to_string();
        let expect_path = csv_path.with_extension("expect.json");
        Ok(FixtureMetadata {
            name,
            csv_path: csv_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Read an expectation file
pub fn load_expectations(path: &Path) -> Result<FixtureExpectations> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading expectation {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}
