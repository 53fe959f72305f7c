// Calibration module - gauge factor evaluation and setup checks
//
// This module provides two main components:
// 1. SetupValidator: rejects unusable bar constants and thresholds
// 2. GaugeFactorCalculator: recording -> pulses -> gauge factor and wave speed

pub mod gauge_factor;
pub mod validation;

pub use gauge_factor::{evaluate, GaugeFactorCalculator, GaugeFactorResult};
pub use validation::SetupValidator;
