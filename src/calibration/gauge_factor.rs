//! Gauge factor and bar wave speed from a detected pulse pair.
//!
//! The striker hitting the bar at velocity `v` launches a strain of
//! `v / (2c)`. The gauge's bridge output for that strain, divided by the
//! excitation and amplifier gain, gives the gauge factor; `c` itself comes
//! from the round trip `2L` between incident and reflected pulse starts.

use serde::{Deserialize, Serialize};

use crate::analysis::{PulseAnalysis, PulseDetector};
use crate::calibration::validation::SetupValidator;
use crate::config::{AppConfig, BarSetup};
use crate::error::{log_gauge_factor_error, CalibrationError, GaugeFactorError};
use crate::recording::SignalRecord;

/// Derived calibration quantities for one channel of one shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeFactorResult {
    pub gauge_factor: f64,
    pub wave_speed_m_s: f64,
    /// Theoretical strain in the bar (unitless)
    pub bar_strain: f64,
    /// |output / excitation| at the incident peak
    pub voltage_ratio: f64,
    pub peak_voltage_v: f64,
    pub transit_samples: usize,
    pub transit_time_s: f64,
    pub time_step_s: f64,
    pub pulses: PulseAnalysis,
}

/// Apply the calibration formula to detected pulses
pub fn evaluate(
    bar: &BarSetup,
    pulses: PulseAnalysis,
    time_step_s: f64,
) -> Result<GaugeFactorResult, CalibrationError> {
    SetupValidator::validate_bar(bar)?;

    let peak_voltage_v = pulses.incident.peak_voltage_v;
    let voltage_ratio = (peak_voltage_v / bar.excitation_voltage_v).abs();

    let transit_samples = pulses.transit_samples();
    if transit_samples == 0 {
        return Err(CalibrationError::ZeroTransitTime);
    }
    let transit_time_s = transit_samples as f64 * time_step_s;

    let wave_speed_m_s = 2.0 * bar.gauge_to_interface_mm / (1000.0 * transit_time_s);
    let bar_strain = bar.striker_velocity_m_s / (2.0 * wave_speed_m_s);
    let gauge_factor = 2.0 * voltage_ratio / (bar_strain * bar.amplification);

    Ok(GaugeFactorResult {
        gauge_factor,
        wave_speed_m_s,
        bar_strain,
        voltage_ratio,
        peak_voltage_v,
        transit_samples,
        transit_time_s,
        time_step_s,
        pulses,
    })
}

/// Runs pulse detection and the calibration formula with one configuration
pub struct GaugeFactorCalculator {
    config: AppConfig,
}

impl GaugeFactorCalculator {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Compute the gauge factor of a 1-based channel of a recording
    pub fn compute(
        &self,
        record: &SignalRecord,
        channel: usize,
    ) -> Result<GaugeFactorResult, GaugeFactorError> {
        let result = self.compute_inner(record, channel);
        if let Err(err) = &result {
            log_gauge_factor_error(err, &record.name());
        }
        result
    }

    fn compute_inner(
        &self,
        record: &SignalRecord,
        channel: usize,
    ) -> Result<GaugeFactorResult, GaugeFactorError> {
        self.config.validate()?;

        let signal = record.channel(channel)?;
        let time_step_s = record.time_step()?;
        let pulses = PulseDetector::new(&self.config.detection).detect(signal)?;
        let result = evaluate(&self.config.bar, pulses, time_step_s)?;

        tracing::info!(
            "[GaugeFactor] {} ch{}: gauge factor {:.3}, wave speed {:.1} m/s ({} samples @ {:e} s)",
            record.name(),
            channel,
            result.gauge_factor,
            result.wave_speed_m_s,
            result.transit_samples,
            time_step_s
        );
        Ok(result)
    }
}

impl Default for GaugeFactorCalculator {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
