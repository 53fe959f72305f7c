//! Immutable in-memory recording of one calibration shot.

use std::path::{Path, PathBuf};

use crate::error::SignalError;

/// Time base and channel voltages captured by the oscilloscope
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    source: Option<PathBuf>,
    time_s: Vec<f64>,
    channels: Vec<Vec<f64>>,
}

impl SignalRecord {
    /// Build a record from a time column and one column per channel
    ///
    /// # Returns
    /// * `Ok(SignalRecord)` - At least two samples, all columns equal length
    /// * `Err(SignalError)` - Too few samples, mismatched or non-finite columns
    pub fn new(time_s: Vec<f64>, channels: Vec<Vec<f64>>) -> Result<Self, SignalError> {
        if time_s.len() < 2 {
            return Err(SignalError::TooFewSamples {
                required: 2,
                found: time_s.len(),
            });
        }
        if channels.is_empty() {
            return Err(SignalError::ChannelOutOfRange {
                channel: 1,
                available: 0,
            });
        }

        for (idx, channel) in channels.iter().enumerate() {
            if channel.len() != time_s.len() {
                return Err(SignalError::RaggedRow {
                    line: (channel.len().min(time_s.len()) + 1) as u64,
                    expected: time_s.len(),
                    found: channel.len(),
                });
            }
            if let Some(pos) = channel.iter().position(|v| !v.is_finite()) {
                return Err(SignalError::Parse {
                    line: (pos + 1) as u64,
                    column: idx + 2,
                    value: channel[pos].to_string(),
                });
            }
        }
        if let Some(pos) = time_s.iter().position(|v| !v.is_finite()) {
            return Err(SignalError::Parse {
                line: (pos + 1) as u64,
                column: 1,
                value: time_s[pos].to_string(),
            });
        }

        Ok(Self {
            source: None,
            time_s,
            channels,
        })
    }

    /// Attach the file the record was read from
    pub fn with_source<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// File stem of the source, used as the shot name in reports
    pub fn name(&self) -> String {
        self.source
            .as_deref()
            .and_then(|path| path.file_stem())
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.split('.').next().unwrap_or(stem).to_string())
            .unwrap_or_else(|| "in-memory".to_string())
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn time(&self) -> &[f64] {
        &self.time_s
    }

    /// Voltages of a 1-based oscilloscope channel
    pub fn channel(&self, channel: usize) -> Result<&[f64], SignalError> {
        if channel == 0 || channel > self.channels.len() {
            return Err(SignalError::ChannelOutOfRange {
                channel,
                available: self.channels.len(),
            });
        }
        Ok(&self.channels[channel - 1])
    }

    /// Sampling interval taken from the first two time stamps (s)
    pub fn time_step(&self) -> Result<f64, SignalError> {
        let step = self.time_s[1] - self.time_s[0];
        if !step.is_finite() || step <= 0.0 {
            return Err(SignalError::InvalidTimeStep { step });
        }
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SignalRecord {
        SignalRecord::new(
            vec![0.0, 1e-6, 2e-6],
            vec![vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3]],
        )
        .unwrap()
    }

    #[test]
    fn test_channel_access_is_one_based() {
        let record = record();
        assert_eq!(record.channel(1).unwrap(), &[0.1, 0.2, 0.3]);
        assert_eq!(record.channel(2).unwrap(), &[-0.1, -0.2, -0.3]);
        assert_eq!(
            record.channel(0).unwrap_err(),
            SignalError::ChannelOutOfRange {
                channel: 0,
                available: 2
            }
        );
        assert!(record.channel(3).is_err());
    }

    #[test]
    fn test_time_step() {
        let step = record().time_step().unwrap();
        assert!((step - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn test_non_increasing_time_rejected() {
        let record = SignalRecord::new(vec![1.0, 1.0], vec![vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            record.time_step(),
            Err(SignalError::InvalidTimeStep { .. })
        ));
    }

    #[test]
    fn test_single_sample_rejected() {
        let err = SignalRecord::new(vec![0.0], vec![vec![0.0]]).unwrap_err();
        assert_eq!(
            err,
            SignalError::TooFewSamples {
                required: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let err = SignalRecord::new(vec![0.0, 1.0, 2.0], vec![vec![0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, SignalError::RaggedRow { .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = SignalRecord::new(vec![0.0, 1.0], vec![vec![0.0, f64::NAN]]).unwrap_err();
        assert!(matches!(err, SignalError::Parse { line: 2, column: 2, .. }));
    }

    #[test]
    fn test_name_from_source() {
        let record = record().with_source("/data/shots/cal_shot_03.csv");
        assert_eq!(record.name(), "cal_shot_03");
        assert_eq!(SignalRecord::new(vec![0.0, 1.0], vec![vec![0.0, 0.0]]).unwrap().name(), "in-memory");
    }
}
