//! Text and JSON renderings of a computed gauge factor.

use serde::Serialize;

use crate::calibration::GaugeFactorResult;
use crate::recording::SignalRecord;

const BANNER_WIDTH: usize = 80;

/// Report payload for one processed channel
#[derive(Debug, Clone, Serialize)]
pub struct ShotReport<'a> {
    pub shot: String,
    pub source: Option<String>,
    pub channel: usize,
    pub result: &'a GaugeFactorResult,
}

impl<'a> ShotReport<'a> {
    pub fn new(record: &SignalRecord, channel: usize, result: &'a GaugeFactorResult) -> Self {
        Self {
            shot: record.name(),
            source: record.source().map(|path| path.display().to_string()),
            channel,
            result,
        }
    }

    /// Banner plus rounded gauge factor and wave speed
    pub fn to_text(&self) -> String {
        let rule = "-".repeat(BANNER_WIDTH);
        let mut text = format!(
            "{rule}\nPROCESSING GAUGE FACTOR & WAVESPEED OF: {} \n{rule}\n",
            self.shot
        );
        if let Some(source) = &self.source {
            text.push_str(&format!("Original file path:{}\n", source));
        }
        text.push_str(&format!(
            "Gauge Factor: {} \nWave speed: {} m/s \n",
            round_half_even(self.result.gauge_factor),
            round_half_even(self.result.wave_speed_m_s)
        ));
        text
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Nearest integer, ties to even
fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}
