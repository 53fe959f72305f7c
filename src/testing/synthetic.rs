//! Deterministic synthetic calibration shots.
//!
//! A synthetic shot reproduces what the input bar gauge records when a
//! striker hits a free bar: a compressive trapezoid followed, one round trip
//! later, by the tensile reflection of the same amplitude. The amplitude is
//! derived from a chosen gauge factor so analysis results can be checked
//! against known values.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::calibration::validation::SetupValidator;
use crate::config::BarSetup;
use crate::error::{CalibrationError, GaugeFactorError, SignalError};
use crate::recording::SignalRecord;

/// Declarative description of a synthetic shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticShot {
    pub gauge_factor: f64,
    pub wave_speed_m_s: f64,
    pub time_step_s: f64,
    pub samples: usize,
    /// Last quiet sample before the incident pulse rises
    pub incident_onset: usize,
    pub pulse_samples: usize,
    pub rise_samples: usize,
    pub baseline_v: f64,
    /// Half-width of uniform noise added to every sample (V)
    pub noise_v: f64,
    pub seed: u64,
    /// 1-based channel carrying the gauge signal, others stay at zero
    pub channel: usize,
    pub channel_count: usize,
    /// Record the incident pulse as negative
    pub inverted: bool,
    pub bar: BarSetup,
}

impl Default for SyntheticShot {
    fn default() -> Self {
        Self {
            gauge_factor: 120.0,
            wave_speed_m_s: 5000.0,
            time_step_s: 4e-7,
            samples: 3000,
            incident_onset: 1200,
            pulse_samples: 500,
            rise_samples: 20,
            baseline_v: 0.0,
            noise_v: 0.0,
            seed: 0x5A5A_FFF0,
            channel: 1,
            channel_count: 4,
            inverted: false,
            bar: BarSetup::default(),
        }
    }
}

impl SyntheticShot {
    /// Strain launched by the striker
    pub fn bar_strain(&self) -> f64 {
        self.bar.striker_velocity_m_s / (2.0 * self.wave_speed_m_s)
    }

    /// Plateau voltage of the incident pulse at the amplifier output
    pub fn pulse_amplitude_v(&self) -> f64 {
        self.gauge_factor * self.bar_strain() * self.bar.amplification
            * self.bar.excitation_voltage_v
            / 2.0
    }

    /// Round trip gauge -> free end -> gauge, in samples
    ///
    /// Saturates for setups whose round trip cannot fit in memory;
    /// [`validate`](Self::validate) rejects those.
    pub fn transit_samples(&self) -> usize {
        self.round_trip_samples() as usize
    }

    fn round_trip_samples(&self) -> f64 {
        let round_trip_s =
            2.0 * self.bar.gauge_to_interface_mm / (1000.0 * self.wave_speed_m_s);
        (round_trip_s / self.time_step_s).round()
    }

    pub fn validate(&self) -> Result<(), GaugeFactorError> {
        SetupValidator::validate_bar(&self.bar)?;
        for (field, value) in [
            ("gauge_factor", self.gauge_factor),
            ("wave_speed_m_s", self.wave_speed_m_s),
            ("time_step_s", self.time_step_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalibrationError::InvalidSetup {
                    field: field.to_string(),
                    value,
                }
                .into());
            }
        }
        if !self.noise_v.is_finite() || self.noise_v < 0.0 {
            return Err(CalibrationError::InvalidSetup {
                field: "noise_v".to_string(),
                value: self.noise_v,
            }
            .into());
        }
        if self.rise_samples == 0 || self.pulse_samples < 2 * self.rise_samples {
            return Err(CalibrationError::InvalidSetup {
                field: "pulse_samples (must be at least twice rise_samples)".to_string(),
                value: self.pulse_samples as f64,
            }
            .into());
        }
        if self.channel == 0 || self.channel > self.channel_count {
            return Err(SignalError::ChannelOutOfRange {
                channel: self.channel,
                available: self.channel_count,
            }
            .into());
        }

        let transit = self.round_trip_samples();
        if !transit.is_finite() || transit > self.samples as f64 {
            return Err(CalibrationError::InvalidSetup {
                field: "transit_samples (round trip longer than the recording)".to_string(),
                value: transit,
            }
            .into());
        }

        let required = self
            .incident_onset
            .checked_add(self.transit_samples())
            .and_then(|n| n.checked_add(self.pulse_samples))
            .and_then(|n| n.checked_add(2))
            .unwrap_or(usize::MAX);
        if self.incident_onset == 0 || self.samples < required {
            return Err(SignalError::TooFewSamples {
                required,
                found: self.samples,
            }
            .into());
        }
        Ok(())
    }

    /// Build the recording described by this shot
    pub fn generate(&self) -> Result<SignalRecord, GaugeFactorError> {
        self.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut signal: Vec<f64> = (0..self.samples)
            .map(|_| {
                if self.noise_v > 0.0 {
                    self.baseline_v + rng.gen_range(-self.noise_v..=self.noise_v)
                } else {
                    self.baseline_v
                }
            })
            .collect();

        let polarity = if self.inverted { -1.0 } else { 1.0 };
        let amplitude = polarity * self.pulse_amplitude_v();
        let reflected_onset = self.incident_onset + self.transit_samples();
        self.add_trapezoid(&mut signal, self.incident_onset, amplitude);
        self.add_trapezoid(&mut signal, reflected_onset, -amplitude);

        let time_s = (0..self.samples)
            .map(|i| i as f64 * self.time_step_s)
            .collect();
        let mut channels = vec![vec![0.0; self.samples]; self.channel_count];
        channels[self.channel - 1] = signal;

        tracing::debug!(
            "[Synthetic] {} samples, amplitude {:.4} V, transit {} samples",
            self.samples,
            amplitude,
            self.transit_samples()
        );
        Ok(SignalRecord::new(time_s, channels)?)
    }

    /// Zero at `onset`, linear rise, plateau, linear fall back to zero
    fn add_trapezoid(&self, signal: &mut [f64], onset: usize, amplitude: f64) {
        let len = self.pulse_samples;
        let rise = self.rise_samples;
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shot_constants() {
        let shot = SyntheticShot::default();
        assert_eq!(shot.transit_samples(), 1000);
        assert!((shot.bar_strain() - 5.5e-4).abs() < 1e-15);
        assert!((shot.pulse_amplitude_v() - 1.32).abs() < 1e-12);
    }

    #[test]
    fn test_generate_places_pulses() {
        let record = SyntheticShot::default().generate().unwrap();
        let signal = record.channel(1).unwrap();

        assert_eq!(record.len(), 3000);
        assert_eq!(record.channel_count(), 4);
        assert_eq!(signal[1200], 0.0);
        assert!(signal[1201] > 0.0);
        assert!((signal[1400] - 1.32).abs() < 1e-12);
        assert!((signal[2400] + 1.32).abs() < 1e-12);
        assert!(record.channel(2).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_noise_is_seeded() {
        let shot = SyntheticShot {
            noise_v: 0.002,
            ..SyntheticShot::default()
        };
        assert_eq!(shot.generate().unwrap(), shot.generate().unwrap());

        let other = SyntheticShot {
            seed: 7,
            ..shot.clone()
        };
        assert_ne!(shot.generate().unwrap(), other.generate().unwrap());
    }

    #[test]
    fn test_too_short_recording_rejected() {
        let shot = SyntheticShot {
            samples: 2000,
            ..SyntheticShot::default()
        };
        assert!(matches!(
            shot.generate(),
            Err(GaugeFactorError::Signal(SignalError::TooFewSamples { .. }))
        ));
    }

    #[test]
    fn test_unrepresentable_round_trip_rejected() {
        for shot in [
            SyntheticShot {
                wave_speed_m_s: 1e-300,
                ..SyntheticShot::default()
            },
            SyntheticShot {
                time_step_s: 1e-300,
                ..SyntheticShot::default()
            },
        ] {
            assert!(matches!(
                shot.generate(),
                Err(GaugeFactorError::Calibration(CalibrationError::InvalidSetup { .. }))
            ));
        }
    }

    #[test]
    fn test_huge_onset_does_not_overflow() {
        let shot = SyntheticShot {
            incident_onset: usize::MAX - 10,
            ..SyntheticShot::default()
        };
        assert!(matches!(
            shot.validate(),
            Err(GaugeFactorError::Signal(SignalError::TooFewSamples {
                required: usize::MAX,
                ..
            }))
        ));
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let shot = SyntheticShot {
            channel: 5,
            ..SyntheticShot::default()
        };
        assert!(shot.generate().is_err());
    }
}
