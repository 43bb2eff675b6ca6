//! RGB → HSL conversion and hex colour parsing

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An sRGB colour with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hsl(self) -> Hsl {
        Hsl::from(self)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Hex colour parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexParseError {
    #[error("hex colour must start with '#'")]
    MissingHash,
    #[error("hex colour must be #RGB or #RRGGBB, got {0} digits")]
    InvalidLength(usize),
    #[error("invalid hex digit in {0:?}")]
    InvalidDigit(String),
}

impl FromStr for Rgb {
    type Err = HexParseError;

    /// Parse `#RGB` or `#RRGGBB`; short-form digits are doubled (`#F00` → `#FF0000`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').ok_or(HexParseError::MissingHash)?;
        // from_str_radix alone would accept a leading '+'
        if !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexParseError::InvalidDigit(s.to_string()));
        }

        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16).map_err(|_| HexParseError::InvalidDigit(s.to_string()))
        };

        match digits.len() {
            3 => {
                let doubled = |i: usize| channel(&digits[i..=i].repeat(2));
                Ok(Rgb::new(doubled(0)?, doubled(1)?, doubled(2)?))
            }
            6 => Ok(Rgb::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            n => Err(HexParseError::InvalidLength(n)),
        }
    }
}

/// HSL colour, each component an integer percentage in [0, 100]
///
/// Components are truncated, not rounded, so (0, 255, 0) has hue 33.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u8,
    pub saturation: u8,
    pub lightness: u8,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = f64::from(rgb.r) / 255.0;
        let g = f64::from(rgb.g) / 255.0;
        let b = f64::from(rgb.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let l = (max + min) / 2.0;

        let (h, s) = if delta == 0.0 {
            (0.0, 0.0)
        } else {
            let s = if l > 0.5 {
                delta / (2.0 - max - min)
            } else {
                delta / (max + min)
            };
            // Shared maxima resolve blue over green over red
            let h = if b == max {
                (r - g) / delta + 4.0
            } else if g == max {
                (b - r) / delta + 2.0
            } else {
                (g - b) / delta + if g < b { 6.0 } else { 0.0 }
            };
            (h / 6.0, s)
        };

        Self {
            hue: to_percent(h),
            saturation: to_percent(s),
            lightness: to_percent(l),
        }
    }
}

fn to_percent(x: f64) -> u8 {
    (x * 100.0).clamp(0.0, 100.0) as u8
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsl(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let c = Rgb::new(r, g, b).to_hsl();
        (c.hue, c.saturation, c.lightness)
    }

    #[test]
    fn test_primary_colours() {
        assert_eq!(hsl(255, 0, 0), (0, 100, 50));
        assert_eq!(hsl(0, 255, 0), (33, 100, 50));
        assert_eq!(hsl(0, 0, 255), (66, 100, 50));
    }

    #[test]
    fn test_achromatic() {
        assert_eq!(hsl(255, 255, 255), (0, 0, 100));
        assert_eq!(hsl(0, 0, 0), (0, 0, 0));
        assert_eq!(hsl(128, 128, 128), (0, 0, 50));
    }

    #[test]
    fn test_shared_maximum_channels() {
        // Yellow, cyan, magenta sit exactly on branch boundaries
        assert_eq!(hsl(255, 255, 0), (16, 100, 50));
        assert_eq!(hsl(0, 255, 255), (50, 100, 50));
        assert_eq!(hsl(255, 0, 255), (83, 100, 50));
    }

    #[test]
    fn test_red_branch_wraps_when_blue_exceeds_green() {
        // Rose: red max, b > g, hue lands near 1.0 rather than going negative
        let (h, s, _) = hsl(255, 0, 128);
        assert_eq!(h, 91);
        assert_eq!(s, 100);
    }

    #[test]
    fn test_truncation_not_rounding() {
        let (_, _, l) = hsl(102, 0, 0);
        assert_eq!(l, 20);
        // 0.999 lightness must not round up to 100
        let (_, _, l) = hsl(255, 255, 254);
        assert_eq!(l, 99);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Rgb::new(255, 0, 0).to_hsl().to_string(), "hsl(0, 100%, 50%)");
    }

    #[test]
    fn test_hex_long_and_short_forms() {
        assert_eq!("#FF0000".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert_eq!("#F00".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert_eq!("#1a2B3c".parse::<Rgb>().unwrap(), Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!("#abc".parse::<Rgb>().unwrap(), Rgb::new(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!("FF0000".parse::<Rgb>(), Err(HexParseError::MissingHash));
        assert_eq!("#FF00".parse::<Rgb>(), Err(HexParseError::InvalidLength(4)));
        assert!(matches!("#GG0000".parse::<Rgb>(), Err(HexParseError::InvalidDigit(_))));
        assert!(matches!("#+F0".parse::<Rgb>(), Err(HexParseError::InvalidDigit(_))));
    }
}
