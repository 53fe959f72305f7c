// Recording module - oscilloscope exports of the input bar gauge signal
//
// This module provides two components:
// 1. SignalRecord: immutable time base plus channel voltages of one shot
// 2. Loader: parser for the semicolon separated oscilloscope CSV layout

pub mod loader;
pub mod record;

pub use loader::{load_csv, parse_csv, write_csv};
pub use record::SignalRecord;
