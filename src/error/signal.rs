// Signal recording error types and constants

use crate::error::ErrorCode;
use std::fmt;
use log::error;

/// Signal error code constants
///
/// Error code range: 1001-1007
pub struct SignalErrorCodes {}

impl SignalErrorCodes {
    /// Recording file could not be opened or read
    pub const IO: i32 = 1001;

    /// A data row held a value that is not a finite number
    pub const PARSE: i32 = 1002;

    /// The data section of the recording is empty
    pub const EMPTY: i32 = 1003;

    /// A data row has a different column count than the first row
    pub const RAGGED_ROW: i32 = 1004;

    /// Fewer samples than the operation needs
    pub const TOO_FEW_SAMPLES: i32 = 1005;

    /// Requested channel does not exist in the recording
    pub const CHANNEL_OUT_OF_RANGE: i32 = 1006;

    /// Time column does not yield a positive sampling interval
    pub const INVALID_TIME_STEP: i32 = 1007;
}

/// Log a signal error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_signal_error(err: &SignalError, context: &str) {
    error!(
        "Signal error in {}: code={}, component=SignalRecord, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or accessing a recorded signal
#[derive(Debug, Clone, PartialEq)]
pub enum SignalError {
    /// Underlying I/O or CSV reader failure
    Io { details: String },

    /// Value on a data line could not be parsed
    Parse {
        line: u64,
        column: usize,
        value: String,
    },

    /// No data rows after the preamble
    Empty,

    /// Row width differs from the first data row
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Not enough samples
    TooFewSamples { required: usize, found: usize },

    /// Channel number outside 1..=available
    ChannelOutOfRange { channel: usize, available: usize },

    /// First two time stamps do not increase
    InvalidTimeStep { step: f64 },
}

impl ErrorCode for SignalError {
    fn code(&self) -> i32 {
        match self {
            SignalError::Io { .. } => SignalErrorCodes::IO,
            SignalError::Parse { .. } => SignalErrorCodes::PARSE,
            SignalError::Empty => SignalErrorCodes::EMPTY,
            SignalError::RaggedRow { .. } => SignalErrorCodes::RAGGED_ROW,
            SignalError::TooFewSamples { .. } => SignalErrorCodes::TOO_FEW_SAMPLES,
            SignalError::ChannelOutOfRange { .. } => SignalErrorCodes::CHANNEL_OUT_OF_RANGE,
            SignalError::InvalidTimeStep { .. } => SignalErrorCodes::INVALID_TIME_STEP,
        }
    }

    fn message(&self) -> String {
        match self {
            SignalError::Io { details } => format!("Failed to read recording: {}", details),
            SignalError::Parse {
                line,
                column,
                value,
            } => {
                format!(
                    "Line {} column {}: '{}' is not a finite number",
                    line, column, value
                )
            }
            SignalError::Empty => "Recording contains no data rows".to_string(),
            SignalError::RaggedRow {
                line,
                expected,
                found,
            } => {
                format!(
                    "Line {} has {} columns, expected {}",
                    line, found, expected
                )
            }
            SignalError::TooFewSamples { required, found } => {
                format!("Too few samples: need {}, got {}", required, found)
            }
            SignalError::ChannelOutOfRange { channel, available } => {
                format!(
                    "Channel {} out of range (recording has channels 1-{})",
                    channel, available
                )
            }
            SignalError::InvalidTimeStep { step } => {
                format!("Time step must be positive and finite (got {})", step)
            }
        }
    }
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SignalError {}

impl From<std::io::Error> for SignalError {
    fn from(err: std::io::Error) -> Self {
        SignalError::Io {
            details: err.to_string(),
        }
    }
}

impl From<csv::Error> for SignalError {
    fn from(err: csv::Error) -> Self {
        SignalError::Io {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_error_codes() {
        assert_eq!(
            SignalError::Io {
                details: "x".to_string()
            }
            .code(),
            SignalErrorCodes::IO
        );
        assert_eq!(SignalError::Empty.code(), 1003);
        assert_eq!(
            SignalError::ChannelOutOfRange {
                channel: 5,
                available: 4
            }
            .code(),
            1006
        );
        assert_eq!(SignalError::InvalidTimeStep { step: 0.0 }.code(), 1007);
    }

    #[test]
    fn test_signal_error_messages() {
        let err = SignalError::Parse {
            line: 12,
            column: 2,
            value: "abc".to_string(),
        };
        assert_eq!(err.message(), "Line 12 column 2: 'abc' is not a finite number");

        let err = SignalError::ChannelOutOfRange {
            channel: 7,
            available: 4,
        };
        assert!(err.message().contains("Channel 7"));
        assert!(err.message().contains("1-4"));

        let err = SignalError::TooFewSamples {
            required: 2,
            found: 1,
        };
        assert!(err.message().contains("need 2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: SignalError = io_err.into();
        match err {
            SignalError::Io { details } => assert!(details.contains("missing file")),
            other => panic!("Expected Io variant, got {:?}", other),
        }
    }

    #[test]
    fn test_signal_error_display() {
        let display = format!("{}", SignalError::Empty);
        assert!(display.contains("SignalError"));
        assert!(display.contains("1003"));
    }
}
