//! Visual style of a practice sheet: glyph font, colors, opacity, grid guides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::render::StyleError;

pub const FONT_SIZE_PERCENT_RANGE: (u16, u16) = (20, 200);
pub const FONT_OPACITY_RANGE: (u8, u8) = (30, 100);
pub const GRID_OPACITY_RANGE: (u8, u8) = (10, 100);

// ────────────────────────────────────────────────────────────────────────────
// Color
// ────────────────────────────────────────────────────────────────────────────

/// An sRGB color written as `#rrggbb` (or the `#rgb` shorthand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Components scaled to `0.0..=1.0`, as PDF color operators expect.
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StyleError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16);
        let parsed = match hex.len() {
            6 => (channel(0, 2), channel(2, 2), channel(4, 2)),
            3 => (channel(0, 1), channel(1, 1), channel(2, 1)),
            _ => return Err(invalid()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b)) if hex.len() == 3 => Ok(Rgb::new(r * 17, g * 17, b * 17)),
            (Ok(r), Ok(g), Ok(b)) => Ok(Rgb::new(r, g, b)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grid guides
// ────────────────────────────────────────────────────────────────────────────

/// Guide lines drawn inside each cell, on top of the cell border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridStyle {
    /// Vertical and horizontal center lines (田字格).
    #[default]
    Default,
    /// Horizontal center line only.
    Lined,
    /// Square paper. Draws the same guides as `Default`.
    Checked,
    /// Center lines plus both diagonals (米字格).
    Rice,
}

/// Which guides a grid style draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guides {
    pub vertical: bool,
    pub horizontal: bool,
    pub diagonals: bool,
}

impl GridStyle {
    pub fn guides(&self) -> Guides {
        match self {
            GridStyle::Default | GridStyle::Checked => Guides {
                vertical: true,
                horizontal: true,
                diagonals: false,
            },
            GridStyle::Lined => Guides {
                vertical: false,
                horizontal: true,
                diagonals: false,
            },
            GridStyle::Rice => Guides {
                vertical: true,
                horizontal: true,
                diagonals: true,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sheet style
// ────────────────────────────────────────────────────────────────────────────

/// Everything a renderer needs besides the page itself.
///
/// Opacities are percentages. `font_size_percent` scales the glyph em size
/// relative to the cell side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetStyle {
    pub font_family: String,
    pub font_size_percent: u16,
    pub font_color: Rgb,
    pub font_opacity: u8,
    pub grid_color: Rgb,
    pub grid_opacity: u8,
    pub grid_style: GridStyle,
    /// Draw glyph outlines instead of filled glyphs.
    pub hollow: bool,
}

impl Default for SheetStyle {
    fn default() -> Self {
        SheetStyle {
            font_family: "Ma Shan Zheng".to_string(),
            font_size_percent: 70,
            font_color: Rgb::new(0x33, 0x33, 0x33),
            font_opacity: 100,
            grid_color: Rgb::new(0, 0, 0),
            grid_opacity: 30,
            grid_style: GridStyle::Default,
            hollow: false,
        }
    }
}

impl SheetStyle {
    /// Checks slider ranges and the font family name.
    pub fn validate(&self) -> Result<(), StyleError> {
        check_range("font_size_percent", self.font_size_percent, FONT_SIZE_PERCENT_RANGE)?;
        check_range("font_opacity", self.font_opacity, FONT_OPACITY_RANGE)?;
        check_range("grid_opacity", self.grid_opacity, GRID_OPACITY_RANGE)?;

        let family = self.font_family.trim();
        if family.is_empty() || family.len() > 64 {
            return Err(StyleError::InvalidFontFamily(self.font_family.clone()));
        }
        // The family name is written verbatim into SVG attributes.
        if family.chars().any(|c| matches!(c, '<' | '>' | '"' | '&' | ';') || c.is_control()) {
            return Err(StyleError::InvalidFontFamily(self.font_family.clone()));
        }
        Ok(())
    }

    pub fn font_alpha(&self) -> f32 {
        self.font_opacity as f32 / 100.0
    }

    pub fn grid_alpha(&self) -> f32 {
        self.grid_opacity as f32 / 100.0
    }

    /// Glyph em size for a cell of the given side length.
    pub fn glyph_size_mm(&self, side_mm: f32) -> f32 {
        side_mm * self.font_size_percent as f32 / 100.0
    }
}

fn check_range<T>(field: &'static str, value: T, (min, max): (T, T)) -> Result<(), StyleError>
where
    T: PartialOrd + Into<u32> + Copy,
{
    if value < min || value > max {
        return Err(StyleError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
