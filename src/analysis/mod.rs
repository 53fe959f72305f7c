// Analysis module - pulse detection on a single input bar channel
//
// Detection runs offline over one recorded shot:
// 1. baseline: mean quiet level removed from the raw channel
// 2. level_crossing: trigger, quiet and sign change searches
// 3. pulse: incident and reflected pulse windows

pub mod baseline;
pub mod level_crossing;
pub mod pulse;

pub use level_crossing::LevelCrossingDetector;
pub use pulse::{IncidentPulse, PulseAnalysis, PulseDetector, ReflectedPulse};
