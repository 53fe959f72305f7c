// Calibration error types and constants

use crate::error::ErrorCode;
use std::fmt;
use log::error;

/// Calibration error code constants
///
/// Error code range: 2001-2007
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// No sample exceeds the trigger voltage
    pub const NO_PULSE: i32 = 2001;

    /// No sign change precedes the incident trigger
    pub const NO_INCIDENT_START: i32 = 2002;

    /// Incident pulse never returns through zero
    pub const NO_INCIDENT_END: i32 = 2003;

    /// No reflected pulse after the search origin
    pub const NO_REFLECTED_PULSE: i32 = 2004;

    /// No quiet sample precedes the reflected trigger
    pub const NO_REFLECTED_START: i32 = 2005;

    /// Incident and reflected starts coincide
    pub const ZERO_TRANSIT_TIME: i32 = 2006;

    /// Bar constant or detection parameter is not usable
    pub const INVALID_SETUP: i32 = 2007;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=GaugeFactorCalculator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while locating pulses or evaluating the gauge factor
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Signal never rises above the trigger voltage
    NoPulse { trigger_voltage: f64 },

    /// No zero crossing before the incident trigger
    NoIncidentStart { trigger: usize },

    /// Incident pulse does not end inside the recording
    NoIncidentEnd { start: usize },

    /// No reflected pulse after the search origin
    NoReflectedPulse { search_from: usize },

    /// No sample below the zero voltage between origin and reflected trigger
    NoReflectedStart { search_from: usize, trigger: usize },

    /// Pulse starts coincide, wave speed is undefined
    ZeroTransitTime,

    /// Invalid bar constant or detection parameter
    InvalidSetup { field: String, value: f64 },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NoPulse { .. } => CalibrationErrorCodes::NO_PULSE,
            CalibrationError::NoIncidentStart { .. } => CalibrationErrorCodes::NO_INCIDENT_START,
            CalibrationError::NoIncidentEnd { .. } => CalibrationErrorCodes::NO_INCIDENT_END,
            CalibrationError::NoReflectedPulse { .. } => CalibrationErrorCodes::NO_REFLECTED_PULSE,
            CalibrationError::NoReflectedStart { .. } => CalibrationErrorCodes::NO_REFLECTED_START,
            CalibrationError::ZeroTransitTime => CalibrationErrorCodes::ZERO_TRANSIT_TIME,
            CalibrationError::InvalidSetup { .. } => CalibrationErrorCodes::INVALID_SETUP,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NoPulse { trigger_voltage } => {
                format!("No sample exceeds the trigger voltage of {} V", trigger_voltage)
            }
            CalibrationError::NoIncidentStart { trigger } => {
                format!("No zero crossing before incident trigger at sample {}", trigger)
            }
            CalibrationError::NoIncidentEnd { start } => {
                format!("Incident pulse starting at sample {} never ends", start)
            }
            CalibrationError::NoReflectedPulse { search_from } => {
                format!("No reflected pulse after sample {}", search_from)
            }
            CalibrationError::NoReflectedStart {
                search_from,
                trigger,
            } => {
                format!(
                    "No quiet sample between {} and reflected trigger at {}",
                    search_from, trigger
                )
            }
            CalibrationError::ZeroTransitTime => {
                "Incident and reflected pulses start at the same sample".to_string()
            }
            CalibrationError::InvalidSetup { field, value } => {
                format!("Invalid {}: {} (must be positive and finite)", field, value)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::NoPulse {
                trigger_voltage: 0.05
            }
            .code(),
            CalibrationErrorCodes::NO_PULSE
        );
        assert_eq!(
            CalibrationError::NoIncidentStart { trigger: 3 }.code(),
            2002
        );
        assert_eq!(CalibrationError::NoIncidentEnd { start: 3 }.code(), 2003);
        assert_eq!(
            CalibrationError::NoReflectedPulse { search_from: 1 }.code(),
            2004
        );
        assert_eq!(
            CalibrationError::NoReflectedStart {
                search_from: 1,
                trigger: 2
            }
            .code(),
            2005
        );
        assert_eq!(CalibrationError::ZeroTransitTime.code(), 2006);
        assert_eq!(
            CalibrationError::InvalidSetup {
                field: "amplification".to_string(),
                value: 0.0
            }
            .code(),
            2007
        );
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::InvalidSetup {
            field: "striker_velocity_m_s".to_string(),
            value: -1.0,
        };
        assert_eq!(
            err.message(),
            "Invalid striker_velocity_m_s: -1 (must be positive and finite)"
        );

        let err = CalibrationError::NoReflectedPulse { search_from: 1370 };
        assert!(err.message().contains("1370"));
    }

    #[test]
    fn test_error_code_trait_object() {
        let err: &dyn ErrorCode = &CalibrationError::ZeroTransitTime;
        assert_eq!(err.code(), 2006);
    }
}
