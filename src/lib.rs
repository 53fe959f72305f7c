// SHPB Gauge Factor - input bar strain gauge calibration
// Recorded shot -> pulse detection -> gauge factor and bar wave speed

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod recording;
pub mod report;
pub mod testing;

// Re-exports for convenience
pub use calibration::{GaugeFactorCalculator, GaugeFactorResult};
pub use config::AppConfig;
pub use recording::SignalRecord;

/// Initialize stderr logging for binaries
///
/// `RUST_LOG` takes precedence over `default_level`. Records emitted through
/// the `log` facade are captured as well.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
