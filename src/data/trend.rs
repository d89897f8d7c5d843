//! Sparkline quantization for channel trends.

use vitalwatch_types::Channel;

/// Number of bar levels a sparkline can show.
pub const SPARKLINE_LEVELS: u8 = 8;

/// Quantize the last `window` points of a normalized channel to
/// `0..SPARKLINE_LEVELS`.
///
/// Takes the already preprocessed series, so every bar matches the z-score
/// the pipeline produced for that point. Returns an empty Vec if there are
/// fewer than two values to compare.
pub fn sparkline(normalized: &Channel, window: usize) -> Vec<u8> {
    let scores: Vec<f64> = normalized
        .tail(window)
        .iter()
        .filter_map(|p| p.value)
        .collect();
    if scores.len() < 2 {
        return Vec::new();
    }
    quantize(&scores)
}

/// Map values onto bar levels using their own min/max.
fn quantize(values: &[f64]) -> Vec<u8> {
    let max_level = (SPARKLINE_LEVELS - 1) as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            if range > 0.0 {
                (((v - min) / range) * max_level).round() as u8
            } else {
                // Flat trend sits mid-height
                (max_level / 2.0) as u8
            }
        })
        .collect()
}
