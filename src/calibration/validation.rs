// Setup validation for calibration runs
//
// Validates the bar constants and detection thresholds before any pulse
// search runs, so a typo in a config file fails loudly instead of
// producing a plausible but wrong gauge factor.

use crate::config::{BarSetup, DetectionConfig};
use crate::error::CalibrationError;

/// Validator for bar constants and detection parameters
pub struct SetupValidator;

impl SetupValidator {
    /// Validate the physical constants of the shot
    ///
    /// # Validation Rules
    /// * Gauge to interface length, striker velocity, excitation voltage and
    ///   amplification must all be finite and > 0
    pub fn validate_bar(bar: &BarSetup) -> Result<(), CalibrationError> {
        positive("gauge_to_interface_mm", bar.gauge_to_interface_mm)?;
        positive("striker_velocity_m_s", bar.striker_velocity_m_s)?;
        positive("excitation_voltage_v", bar.excitation_voltage_v)?;
        positive("amplification", bar.amplification)
    }

    /// Validate the pulse detection thresholds
    ///
    /// # Validation Rules
    /// * Trigger and zero voltages must be finite and > 0
    /// * Zero voltage must not exceed the trigger voltage
    /// * Baseline window must hold at least one sample
    pub fn validate_detection(detection: &DetectionConfig) -> Result<(), CalibrationError> {
        positive("trigger_voltage", detection.trigger_voltage)?;
        positive("zero_voltage", detection.zero_voltage)?;
        if detection.zero_voltage > detection.trigger_voltage {
            return Err(CalibrationError::InvalidSetup {
                field: "zero_voltage (above trigger_voltage)".to_string(),
                value: detection.zero_voltage,
            });
        }
        if detection.baseline_samples == 0 {
            return Err(CalibrationError::InvalidSetup {
                field: "baseline_samples".to_string(),
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> Result<(), CalibrationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidSetup {
            field: field.to_string(),
            value,
        })
    }
}
