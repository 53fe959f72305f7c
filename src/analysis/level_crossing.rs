//! Threshold and zero crossing search over a baseline corrected signal.

/// Sign of a sample: -1, 0 or 1
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Index `i` of every sign change between samples `i` and `i + 1`
pub fn sign_changes(signal: &[f64]) -> impl Iterator<Item = usize> + '_ {
    signal
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| sign(pair[0]) != sign(pair[1]))
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCrossingDetector {
    trigger_voltage: f64,
    zero_voltage: f64,
}

impl LevelCrossingDetector {
    pub fn new(trigger_voltage: f64, zero_voltage: f64) -> Self {
        Self {
            trigger_voltage,
            zero_voltage,
        }
    }

    pub fn trigger_voltage(&self) -> f64 {
        self.trigger_voltage
    }

    fn is_triggered(&self, value: f64) -> bool {
        value.abs() > self.trigger_voltage
    }

    fn is_quiet(&self, value: f64) -> bool {
        value.abs() < self.zero_voltage
    }

    /// First index at or after `from` whose magnitude exceeds the trigger
    pub fn first_trigger(&self, signal: &[f64], from: usize) -> Option<usize> {
        signal
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, v)| self.is_triggered(**v))
            .map(|(i, _)| i)
    }

    /// Like [`first_trigger`](Self::first_trigger), but the following sample
    /// must exceed the trigger too, so single-sample spikes are skipped
    pub fn confirmed_trigger(&self, signal: &[f64], from: usize) -> Option<usize> {
        signal
            .windows(2)
            .enumerate()
            .skip(from)
            .find(|(_, pair)| self.is_triggered(pair[0]) && self.is_triggered(pair[1]))
            .map(|(i, _)| i)
    }

    /// Last index in `[from, to)` whose magnitude is below the zero voltage
    pub fn last_quiet(&self, signal: &[f64], from: usize, to: usize) -> Option<usize> {
        let to = to.min(signal.len());
        if from >= to {
            return None;
        }
        signal[from..to]
            .iter()
            .rposition(|v| self.is_quiet(*v))
            .map(|i| i + from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_changes_include_zero_transitions() {
        let signal = [0.0, 0.0, 0.2, 0.3, -0.1, -0.1, 0.0];
        let changes: Vec<usize> = sign_changes(&signal).collect();
        assert_eq!(changes, vec![1, 3, 5]);
    }

    #[test]
    fn test_first_trigger_respects_start() {
        let detector = LevelCrossingDetector::new(0.05, 0.01);
        let signal = [0.0, 0.1, 0.0, -0.2, 0.0];
        assert_eq!(detector.first_trigger(&signal, 0), Some(1));
        assert_eq!(detector.first_trigger(&signal, 2), Some(3));
        assert_eq!(detector.first_trigger(&signal, 4), None);
    }

    #[test]
    fn test_trigger_is_strictly_above_threshold() {
        let detector = LevelCrossingDetector::new(0.05, 0.01);
        assert_eq!(detector.first_trigger(&[0.05, -0.05], 0), None);
    }

    #[test]
    fn test_confirmed_trigger_skips_spikes() {
        let detector = LevelCrossingDetector::new(0.05, 0.01);
        let signal = [0.0, 0.9, 0.0, 0.0, -0.1, -0.2, -0.3];
        assert_eq!(detector.first_trigger(&signal, 0), Some(1));
        assert_eq!(detector.confirmed_trigger(&signal, 0), Some(4));
    }

    #[test]
    fn test_last_quiet_window() {
        let detector = LevelCrossingDetector::new(0.05, 0.01);
        let signal = [0.0, 0.005, 0.02, 0.004, 0.03, 0.2];
        assert_eq!(detector.last_quiet(&signal, 0, 5), Some(3));
        assert_eq!(detector.last_quiet(&signal, 4, 5), None);
        assert_eq!(detector.last_quiet(&signal, 5, 2), None);
    }
}
