//! Top-N selection of quantized colours

use super::quantize::ColorSample;

/// The `n` most populous samples, most populous first
///
/// The sort is stable: equal counts keep their first-seen order.
pub fn top_colors(mut samples: Vec<ColorSample>, n: usize) -> Vec<ColorSample> {
    samples.sort_by(|a, b| b.count.cmp(&a.count));
    samples.truncate(n);
    samples
}
