//! Small statistics helpers
//!
//! Every helper returns 0 (or `Stable`) for empty input instead of NaN.

use super::types::Trend;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `part / whole`, or 0 when the denominator is not positive
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 && part.is_finite() {
        part / whole
    } else {
        0.0
    }
}

/// Compare the mean of the last `window` values with the `window` before them
///
/// Values must be in chronological order. Without a previous window (or with
/// a zero previous mean) the trend is stable.
pub fn trend(values: &[f64], window: usize, threshold: f64) -> Trend {
    if window == 0 || values.len() <= window {
        return Trend::Stable;
    }
    let split = values.len() - window;
    let recent = &values[split..];
    let previous = &values[split.saturating_sub(window)..split];

    let previous_mean = mean(previous);
    if previous_mean <= 0.0 {
        return Trend::Stable;
    }
    let recent_mean = mean(recent);

    if recent_mean > previous_mean * (1.0 + threshold) {
        Trend::Increasing
    } else if recent_mean < previous_mean * (1.0 - threshold) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}
