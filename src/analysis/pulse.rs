// PulseDetector - incident and reflected pulse location on the input bar
//
// With no specimen the far end of the input bar is free, so the compressive
// incident pulse returns to the gauge as a tensile pulse after travelling
// twice the gauge-to-end distance.
//
// Algorithm:
// 1. Remove the baseline (mean of the leading quiet window)
// 2. Incident trigger: first |v| > trigger voltage; flip polarity if negative
// 3. Incident start: last sign change up to the trigger
// 4. Incident end: second sign change from the start (the first is the start)
// 5. Peak: max |v| between start and end
// 6. Reflected search origin: start + reflection delay, never before the end
// 7. Reflected trigger: first confirmed |v| > trigger after the origin
// 8. Reflected start: last |v| < zero voltage before the reflected trigger

use serde::{Deserialize, Serialize};

use crate::analysis::baseline;
use crate::analysis::level_crossing::{sign_changes, LevelCrossingDetector};
use crate::config::DetectionConfig;
use crate::error::CalibrationError;

/// Incident (compressive) pulse indices into the recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentPulse {
    pub trigger: usize,
    pub start: usize,
    pub end: usize,
    pub peak: usize,
    /// Baseline corrected voltage at the peak, after polarity correction (V)
    pub peak_voltage_v: f64,
}

/// Reflected (tensile) pulse indices into the recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflectedPulse {
    pub search_from: usize,
    pub trigger: usize,
    pub start: usize,
}

/// Outcome of pulse detection on one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseAnalysis {
    /// Mean "no signal" voltage (V)
    pub baseline_v: f64,
    /// True when the incident pulse was recorded negative and flipped
    pub inverted: bool,
    pub incident: IncidentPulse,
    pub reflected: ReflectedPulse,
}

impl PulseAnalysis {
    /// Samples between incident and reflected pulse starts
    pub fn transit_samples(&self) -> usize {
        self.reflected.start.abs_diff(self.incident.start)
    }
}

pub struct PulseDetector {
    crossings: LevelCrossingDetector,
    reflection_delay_samples: usize,
    baseline_samples: usize,
}

impl PulseDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            crossings: LevelCrossingDetector::new(config.trigger_voltage, config.zero_voltage),
            reflection_delay_samples: config.reflection_delay_samples,
            baseline_samples: config.baseline_samples,
        }
    }

    /// Locate both pulses in a raw channel
    pub fn detect(&self, signal: &[f64]) -> Result<PulseAnalysis, CalibrationError> {
        let baseline_v = baseline::measure(signal, self.baseline_samples);
        let mut corrected = baseline::corrected(signal, baseline_v);

        let trigger = self.crossings.first_trigger(&corrected, 0).ok_or(
            CalibrationError::NoPulse {
                trigger_voltage: self.crossings.trigger_voltage(),
            },
        )?;

        let inverted = corrected[trigger] < 0.0;
        if inverted {
            corrected.iter_mut().for_each(|v| *v = -*v);
        }

        let incident = self.incident_pulse(&corrected, trigger)?;
        let reflected = self.reflected_pulse(&corrected, &incident)?;

        tracing::debug!(
            "[PulseDetector] baseline={:.6} V inverted={} incident={:?} reflected={:?}",
            baseline_v,
            inverted,
            incident,
            reflected
        );

        Ok(PulseAnalysis {
            baseline_v,
            inverted,
            incident,
            reflected,
        })
    }

    fn incident_pulse(
        &self,
        corrected: &[f64],
        trigger: usize,
    ) -> Result<IncidentPulse, CalibrationError> {
        let start = sign_changes(&corrected[..=trigger])
            .last()
            .ok_or(CalibrationError::NoIncidentStart { trigger })?;

        let end = sign_changes(&corrected[start..])
            .nth(1)
            .map(|offset| offset + start)
            .ok_or(CalibrationError::NoIncidentEnd { start })?;

        let (peak, peak_voltage_v) = corrected[start..=end]
            .iter()
            .enumerate()
            .fold((start, 0.0_f64), |(best, best_v), (offset, &v)| {
                if v.abs() > best_v.abs() {
                    (start + offset, v)
                } else {
                    (best, best_v)
                }
            });

        Ok(IncidentPulse {
            trigger,
            start,
            end,
            peak,
            peak_voltage_v,
        })
    }

    fn reflected_pulse(
        &self,
        corrected: &[f64],
        incident: &IncidentPulse,
    ) -> Result<ReflectedPulse, CalibrationError> {
        let search_from = if self.reflection_delay_samples > 0 {
            (incident.start + self.reflection_delay_samples).max(incident.end)
        } else {
            incident.end
        };

        let trigger = self
            .crossings
            .confirmed_trigger(corrected, search_from)
            .ok_or(CalibrationError::NoReflectedPulse { search_from })?;

        let start = self
            .crossings
            .last_quiet(corrected, search_from, trigger)
            .ok_or(CalibrationError::NoReflectedStart {
                search_from,
                trigger,
            })?;

        Ok(ReflectedPulse {
            search_from,
            trigger,
            start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trapezoid that is exactly zero at `onset` and rises from the next sample
    fn add_pulse(signal: &mut [f64], onset: usize, len: usize, rise: usize, amplitude: f64) {
        for k in 0..=len {
            let level = if k < rise {
                k as f64 / rise as f64
            } else if k > len - rise {
                (len - k) as f64 / rise as f64
            } else {
                1.0
            };
            if let Some(v) = signal.get_mut(onset + k) {
                *v += amplitude * level;
            }
        }
    }

    fn shot(amplitude: f64) -> Vec<f64> {
        let mut signal = vec![0.0; 3000];
        add_pulse(&mut signal, 1200, 500, 20, amplitude);
        add_pulse(&mut signal, 2200, 500, 20, -amplitude);
        signal
    }

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    #[test]
    fn test_detects_incident_and_reflected_starts() {
        let analysis = PulseDetector::new(&config()).detect(&shot(1.2)).unwrap();

        assert!(!analysis.inverted);
        assert_eq!(analysis.baseline_v, 0.0);
        assert_eq!(analysis.incident.start, 1200);
        assert_eq!(analysis.incident.trigger, 1201);
        assert_eq!(analysis.incident.end, 1699);
        assert!((analysis.incident.peak_voltage_v - 1.2).abs() < 1e-12);
        assert_eq!(analysis.reflected.search_from, 1699);
        assert_eq!(analysis.reflected.start, 2200);
        assert_eq!(analysis.transit_samples(), 1000);
    }

    #[test]
    fn test_negative_incident_pulse_is_flipped() {
        let analysis = PulseDetector::new(&config()).detect(&shot(-1.2)).unwrap();
        assert!(analysis.inverted);
        assert!(analysis.incident.peak_voltage_v > 0.0);
        assert_eq!(analysis.transit_samples(), 1000);
    }

    #[test]
    fn test_baseline_offset_removed() {
        let signal: Vec<f64> = shot(1.2).iter().map(|v| v + 0.25).collect();
        let analysis = PulseDetector::new(&config()).detect(&signal).unwrap();
        assert!((analysis.baseline_v - 0.25).abs() < 1e-12);
        assert_eq!(analysis.transit_samples(), 1000);
        assert!((analysis.incident.peak_voltage_v - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_delay_after_incident_end_moves_search_origin() {
        let config = DetectionConfig {
            reflection_delay_samples: 800,
            ..DetectionConfig::default()
        };
        let analysis = PulseDetector::new(&config).detect(&shot(1.2)).unwrap();
        assert_eq!(analysis.reflected.search_from, 2000);
        assert_eq!(analysis.reflected.start, 2200);
    }

    #[test]
    fn test_flat_signal_has_no_pulse() {
        let err = PulseDetector::new(&config()).detect(&[0.01; 2000]).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NoPulse {
                trigger_voltage: 0.05
            }
        );
    }

    #[test]
    fn test_missing_reflection() {
        let mut signal = vec![0.0; 3000];
        add_pulse(&mut signal, 1200, 500, 20, 1.2);
        let err = PulseDetector::new(&config()).detect(&signal).unwrap_err();
        assert_eq!(err, CalibrationError::NoReflectedPulse { search_from: 1699 });
    }

    #[test]
    fn test_truncated_incident_pulse() {
        let mut signal = vec![0.0; 1400];
        add_pulse(&mut signal, 1200, 500, 20, 1.2);
        let err = PulseDetector::new(&config()).detect(&signal).unwrap_err();
        assert_eq!(err, CalibrationError::NoIncidentEnd { start: 1200 });
    }

    #[test]
    fn test_step_signal_never_ends() {
        let mut signal = vec![0.0; 10];
        signal[0] = 1.0;
        let config = DetectionConfig {
            baseline_samples: 1,
            ..DetectionConfig::default()
        };
        // Baseline is the first sample, so the drop after it reads as a step
        let err = PulseDetector::new(&config).detect(&signal).unwrap_err();
        assert_eq!(err, CalibrationError::NoIncidentEnd { start: 0 });
    }

    #[test]
    fn test_detection_is_deterministic() {
        let signal = shot(0.9);
        let detector = PulseDetector::new(&config());
        assert_eq!(detector.detect(&signal).unwrap(), detector.detect(&signal).unwrap());
    }
}
