//! Configuration management for calibration shots
//!
//! This module provides configuration loading from JSON files so the bar
//! constants of a rig and the pulse detection thresholds can be adjusted
//! without recompilation. Every section falls back to the values used on the
//! reference rig when omitted from the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calibration::validation::SetupValidator;
use crate::error::{CalibrationError, SignalError};

/// Config file picked up by [`AppConfig::load`]
pub const DEFAULT_CONFIG_PATH: &str = "assets/gauge_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bar: BarSetup,
    pub detection: DetectionConfig,
    pub recording: RecordingConfig,
}

/// Physical constants of the input bar and the calibration shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarSetup {
    /// Distance from the gauge to the reflecting free end (mm)
    pub gauge_to_interface_mm: f64,
    /// Striker velocity from the speed trap (m/s)
    pub striker_velocity_m_s: f64,
    /// Bridge excitation voltage (V)
    pub excitation_voltage_v: f64,
    /// Input bar amplifier gain
    pub amplification: f64,
}

impl Default for BarSetup {
    fn default() -> Self {
        Self {
            gauge_to_interface_mm: 1000.0,
            striker_velocity_m_s: 5.5,
            excitation_voltage_v: 4.0,
            amplification: 10.0,
        }
    }
}

/// Pulse detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Voltage that marks a pulse as present (V)
    pub trigger_voltage: f64,
    /// Voltage below which the signal counts as quiet (V)
    pub zero_voltage: f64,
    /// Samples after the incident start before the reflected pulse is searched.
    /// Zero means search from the incident pulse end.
    pub reflection_delay_samples: usize,
    /// Leading samples averaged for the "no signal" baseline
    pub baseline_samples: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            trigger_voltage: 0.05,
            zero_voltage: 0.01,
            // Skips ringing right after the incident pulse on the reference rig
            reflection_delay_samples: 370,
            baseline_samples: 1000,
        }
    }
}

/// Oscilloscope CSV export layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Instrument preamble lines before the column header
    pub preamble_lines: usize,
    /// Whether a column header line follows the preamble
    pub has_header: bool,
    /// Maximum number of data rows kept
    pub max_samples: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            preamble_lines: 9,
            has_header: true,
            max_samples: 49_999,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the defaults when the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "[Config] Failed to load {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from JSON file, reporting any failure
    ///
    /// Used when the user names a config file explicitly, where silently
    /// falling back to defaults would change the computed gauge factor.
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(&path).map_err(SignalError::from)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Load the configuration bundled next to the working directory
    ///
    /// A missing file is not an error: the reference rig defaults apply.
    pub fn load() -> Self {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            log::debug!("[Config] {:?} not found, using defaults", path);
            return Self::default();
        }
        Self::load_from_file(path)
    }

    /// Check bar constants and detection thresholds
    pub fn validate(&self) -> Result<(), CalibrationError> {
        SetupValidator::validate_bar(&self.bar)?;
        SetupValidator::validate_detection(&self.detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bar.gauge_to_interface_mm, 1000.0);
        assert_eq!(config.bar.striker_velocity_m_s, 5.5);
        assert_eq!(config.bar.excitation_voltage_v, 4.0);
        assert_eq!(config.bar.amplification, 10.0);
        assert_eq!(config.detection.trigger_voltage, 0.05);
        assert_eq!(config.detection.zero_voltage, 0.01);
        assert_eq!(config.detection.reflection_delay_samples, 370);
        assert_eq!(config.recording.delimiter, ';');
        assert_eq!(config.recording.preamble_lines, 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "bar": { "striker_velocity_m_s": 7.25 } }"#).unwrap();
        assert_eq!(parsed.bar.striker_velocity_m_s, 7.25);
        assert_eq!(parsed.bar.amplification, 10.0);
        assert_eq!(parsed.detection, DetectionConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/gauge_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_strict_load_rejects_invalid_constants() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bar": {{ "amplification": 0.0 }} }}"#).unwrap();

        let err = AppConfig::try_load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("amplification"));
    }

    #[test]
    fn test_strict_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "detection": {{ "reflection_delay_samples": 0 }}, "recording": {{ "delimiter": "," }} }}"#
        )
        .unwrap();

        let config = AppConfig::try_load_from_file(file.path()).unwrap();
        assert_eq!(config.detection.reflection_delay_samples, 0);
        assert_eq!(config.recording.delimiter, ',');
    }
}
