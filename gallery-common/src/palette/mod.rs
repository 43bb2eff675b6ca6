//! Dominant colour extraction
//!
//! Decode → downsample → quantize → rank → HSL. Each call is independent and
//! holds no state between calls.

pub mod hsl;
pub mod quantize;
pub mod rank;

pub use hsl::{HexParseError, Hsl, Rgb};
pub use quantize::{ColorDistance, ColorSample};

use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

/// Extraction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    /// Maximum number of colours returned
    pub num_colors: usize,
    /// Downsample factor applied to both dimensions, in (0, 1]
    pub resize_factor: f64,
    /// Merge distance, in 8-bit RGB units
    pub tolerance: u32,
    pub distance: ColorDistance,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            num_colors: 3,
            resize_factor: 0.1,
            tolerance: 10,
            distance: ColorDistance::Euclidean,
        }
    }
}

impl ExtractionOptions {
    fn validate(&self) -> Result<(), ExtractionError> {
        let f = self.resize_factor;
        if !f.is_finite() || f <= 0.0 || f > 1.0 {
            return Err(ExtractionError::InvalidParameter(format!(
                "resize_factor must be in (0, 1], got {}",
                f
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid extraction parameter: {0}")]
    InvalidParameter(String),
}

/// Dominant colours of an encoded image, formatted as `hsl(H, S%, L%)`
pub fn extract_colours(bytes: &[u8], options: &ExtractionOptions) -> Result<Vec<String>, ExtractionError> {
    options.validate()?;
    let image = image::load_from_memory(bytes)?;
    let colours = dominant_colours(&image, options)?;
    Ok(colours.iter().map(Hsl::to_string).collect())
}

/// Dominant colours of a decoded image, most populous first
///
/// A downsample that truncates either dimension to zero yields no colours.
pub fn dominant_colours(image: &DynamicImage, options: &ExtractionOptions) -> Result<Vec<Hsl>, ExtractionError> {
    options.validate()?;

    let width = (f64::from(image.width()) * options.resize_factor) as u32;
    let height = (f64::from(image.height()) * options.resize_factor) as u32;
    if width == 0 || height == 0 {
        debug!(
            source_width = image.width(),
            source_height = image.height(),
            resize_factor = options.resize_factor,
            "Downsampled image is empty"
        );
        return Ok(Vec::new());
    }

    let small = image.resize_exact(width, height, FilterType::CatmullRom).to_rgb8();
    let samples = quantize::quantize(&small, options.tolerance, options.distance);
    let distinct = samples.len();
    let top = rank::top_colors(samples, options.num_colors);

    debug!(width, height, distinct, selected = top.len(), "Extracted dominant colours");

    Ok(top.into_iter().map(|s| s.color.to_hsl()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png(img: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        png(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    /// Three vertical bands: 50% red, 30% green, 20% blue
    fn banded() -> Vec<u8> {
        png(RgbImage::from_fn(100, 100, |x, _| {
            if x < 50 {
                image::Rgb([255, 0, 0])
            } else if x < 80 {
                image::Rgb([0, 255, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        }))
    }

    fn is_hsl_string(s: &str) -> bool {
        let Some(inner) = s.strip_prefix("hsl(").and_then(|s| s.strip_suffix("%)")) else {
            return false;
        };
        let parts: Vec<&str> = inner.split(", ").collect();
        if parts.len() != 3 || !parts[1].ends_with('%') {
            return false;
        }
        [parts[0], parts[1].trim_end_matches('%'), parts[2]]
            .iter()
            .all(|p| p.parse::<u8>().map(|v| v <= 100).unwrap_or(false))
    }

    #[test]
    fn test_solid_gray_has_no_saturation() {
        let colours = dominant_colours(
            &image::load_from_memory(&solid(60, 40, [90, 90, 90])).unwrap(),
            &ExtractionOptions::default(),
        )
        .unwrap();
        assert_eq!(colours.len(), 1);
        assert!(colours.iter().all(|c| c.saturation == 0));
    }

    #[test]
    fn test_bands_ranked_by_area() {
        let options = ExtractionOptions { resize_factor: 1.0, ..Default::default() };
        let colours = extract_colours(&banded(), &options).unwrap();
        assert_eq!(
            colours,
            vec!["hsl(0, 100%, 50%)", "hsl(33, 100%, 50%)", "hsl(66, 100%, 50%)"]
        );
    }

    #[test]
    fn test_solid_band_beats_gradient() {
        // 200 columns of red-to-blue gradient, 100 columns of green
        let bytes = png(RgbImage::from_fn(300, 100, |x, _| {
            if x < 200 {
                let t = x * 255 / 199;
                image::Rgb([(255 - t) as u8, 0, t as u8])
            } else {
                image::Rgb([0, 255, 0])
            }
        }));
        let options = ExtractionOptions { resize_factor: 1.0, ..Default::default() };
        let colours = extract_colours(&bytes, &options).unwrap();
        assert_eq!(colours.len(), 3);
        assert_eq!(colours[0], "hsl(33, 100%, 50%)");
    }

    #[test]
    fn test_output_bounded_and_well_formed() {
        let options = ExtractionOptions { resize_factor: 1.0, num_colors: 2, ..Default::default() };
        let colours = extract_colours(&banded(), &options).unwrap();
        assert_eq!(colours.len(), 2);
        assert!(colours.iter().all(|c| is_hsl_string(c)), "{:?}", colours);

        let none = ExtractionOptions { num_colors: 0, ..options };
        assert!(extract_colours(&banded(), &none).unwrap().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let bytes = banded();
        let options = ExtractionOptions { resize_factor: 0.37, tolerance: 25, ..Default::default() };
        let first = extract_colours(&bytes, &options).unwrap();
        for _ in 0..3 {
            assert_eq!(extract_colours(&bytes, &options).unwrap(), first);
        }
    }

    #[test]
    fn test_degenerate_resize_is_empty() {
        // 5 * 0.1 truncates to 0
        let colours = extract_colours(&solid(5, 5, [10, 20, 30]), &ExtractionOptions::default()).unwrap();
        assert!(colours.is_empty());
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = extract_colours(b"definitely not an image", &ExtractionOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode(_)));
    }

    #[test]
    fn test_invalid_resize_factor() {
        for factor in [0.0, -0.5, 1.5, f64::NAN] {
            let options = ExtractionOptions { resize_factor: factor, ..Default::default() };
            let err = extract_colours(&solid(10, 10, [0, 0, 0]), &options).unwrap_err();
            assert!(matches!(err, ExtractionError::InvalidParameter(_)), "factor {}", factor);
        }
    }

    #[test]
    fn test_hsl_string_checker() {
        assert!(is_hsl_string("hsl(0, 100%, 50%)"));
        assert!(!is_hsl_string("hsl(0, 101%, 50%)"));
        assert!(!is_hsl_string("Failed to decode image"));
    }
}
