//! Tint colors for the particle field.
//!
//! Hosts hand the field a CSS-style hex string. The engine resolves it with
//! [`Rgb::from_hex_lossy`], which never fails; configuration loaders use the
//! strict [`FromStr`] implementation instead.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// An opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// An RGB color with a floating point opacity in `[0, 1]`, used as fill style.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Error returned by the strict hex parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("expected 3 or 6 hex digits, found {0}")]
    Length(usize),
    #[error("invalid hex digit {0:?}")]
    Digit(char),
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Splits a packed `0xRRGGBB` integer into channels.
    ///
    /// Bits above the lowest 24 are ignored.
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Parses a hex color without ever failing.
    ///
    /// One leading `#` is stripped and a 3-digit value is expanded digit by
    /// digit (`"abc"` becomes `"aabbcc"`). The longest leading run of hex
    /// digits is then read as an integer, keeping its low 32 bits, and split
    /// into channels with [`Rgb::from_u32`].
    ///
    /// Malformed input therefore still yields *some* color: an empty or
    /// non-hex string is black, `"12zz"` reads as `0x12`, and an 8-digit
    /// string keeps only its last six digits' worth of channels.
    pub fn from_hex_lossy(hex: &str) -> Self {
        let digits = hex.strip_prefix('#').unwrap_or(hex);

        let expanded: String;
        let digits = if digits.chars().count() == 3 {
            expanded = digits.chars().flat_map(|c| [c, c]).collect();
            expanded.as_str()
        } else {
            digits
        };

        let packed = digits
            .chars()
            .map_while(|c| c.to_digit(16))
            .fold(0u32, |acc, d| acc.wrapping_mul(16).wrapping_add(d));

        Self::from_u32(packed)
    }

    /// Attaches an opacity to this color.
    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseColorError::Digit(bad));
        }
        match digits.len() {
            3 | 6 => Ok(Self::from_hex_lossy(digits)),
            n => Err(ParseColorError::Length(n)),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}
