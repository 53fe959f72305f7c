// Baseline - "no signal" level of the bridge before the striker arrives
//
// The amplifier output sits at a small offset while the bar is at rest.
// Averaging the leading window and subtracting it centers the quiet
// signal on zero so sign changes mark pulse boundaries.

/// Mean of the first `window` samples (fewer when the signal is shorter)
pub fn measure(signal: &[f64], window: usize) -> f64 {
    let n = window.min(signal.len());
    if n == 0 {
        return 0.0;
    }
    signal[..n].iter().sum::<f64>() / n as f64
}

/// Signal with the baseline removed
pub fn corrected(signal: &[f64], baseline: f64) -> Vec<f64> {
    signal.iter().map(|v| v - baseline).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_leading_window() {
        let signal = [1.0, 3.0, 100.0, 100.0];
        assert_eq!(measure(&signal, 2), 2.0);
    }

    #[test]
    fn test_measure_short_signal_uses_all_samples() {
        assert_eq!(measure(&[2.0, 4.0], 1000), 3.0);
        assert_eq!(measure(&[], 1000), 0.0);
    }

    #[test]
    fn test_corrected() {
        assert_eq!(corrected(&[0.5, 1.5], 0.5), vec![0.0, 1.0]);
    }
}
