// Error types for the gauge factor calculator
//
// This module defines custom error types for recording and calibration operations,
// providing structured error handling with stable numeric codes for reports and exit status.

mod calibration;
mod signal;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use signal::{log_signal_error, SignalError, SignalErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling between
/// the library and the CLI reports.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Any failure on the way from a recording to a gauge factor
#[derive(Debug, Clone, PartialEq)]
pub enum GaugeFactorError {
    Signal(SignalError),
    Calibration(CalibrationError),
}

impl ErrorCode for GaugeFactorError {
    fn code(&self) -> i32 {
        match self {
            GaugeFactorError::Signal(err) => err.code(),
            GaugeFactorError::Calibration(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            GaugeFactorError::Signal(err) => err.message(),
            GaugeFactorError::Calibration(err) => err.message(),
        }
    }
}

impl std::fmt::Display for GaugeFactorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GaugeFactorError::Signal(err) => std::fmt::Display::fmt(err, f),
            GaugeFactorError::Calibration(err) => std::fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for GaugeFactorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GaugeFactorError::Signal(err) => Some(err),
            GaugeFactorError::Calibration(err) => Some(err),
        }
    }
}

impl From<SignalError> for GaugeFactorError {
    fn from(err: SignalError) -> Self {
        GaugeFactorError::Signal(err)
    }
}

impl From<CalibrationError> for GaugeFactorError {
    fn from(err: CalibrationError) -> Self {
        GaugeFactorError::Calibration(err)
    }
}

/// Log either error family with its own component tag
pub fn log_gauge_factor_error(err: &GaugeFactorError, context: &str) {
    match err {
        GaugeFactorError::Signal(err) => log_signal_error(err, context),
        GaugeFactorError::Calibration(err) => log_calibration_error(err, context),
    }
}
