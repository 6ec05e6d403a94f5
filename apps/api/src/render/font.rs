//! Fonts available to the PDF writer.
//!
//! Two sources:
//! - `Builtin`: the standard Helvetica font, WinAnsi encoded. Needs no font
//!   file but only covers Latin-1; every other character is left blank.
//! - `Embedded`: a TrueType/OpenType file loaded at startup (`FONT_PATH`),
//!   parsed with fontdue for glyph ids and advances, and embedded whole as a
//!   CID font addressed by glyph id.
//!
//! Metrics are in em units (relative to the font size).

use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use tracing::info;

use crate::render::RenderError;

// ────────────────────────────────────────────────────────────────────────────
// Font source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub enum FontSource {
    #[default]
    Builtin,
    Embedded(Arc<EmbeddedFont>),
}

/// A character encoded for the PDF `Tj` operator.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGlyph {
    pub bytes: Vec<u8>,
    pub advance_em: f32,
}

impl FontSource {
    /// Encodes `ch`, or returns `None` when the font cannot show it.
    pub fn encode(&self, ch: char) -> Option<EncodedGlyph> {
        match self {
            FontSource::Builtin => HELVETICA.encode(ch),
            FontSource::Embedded(font) => font.encode(ch),
        }
    }

    /// Distance from the baseline to the visual middle of a glyph, in em.
    /// Used to center glyphs vertically inside a cell.
    pub fn middle_em(&self) -> f32 {
        match self {
            FontSource::Builtin => HELVETICA.cap_height / 2.0,
            FontSource::Embedded(font) => (font.ascent + font.descent) / 2.0,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FontSource::Builtin => "Helvetica (builtin)".to_string(),
            FontSource::Embedded(font) => format!("{} (embedded)", font.name),
        }
    }
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedded font
// ────────────────────────────────────────────────────────────────────────────

/// A parsed font file plus its raw bytes for embedding.
pub struct EmbeddedFont {
    /// PostScript-safe name used for the PDF font objects.
    pub name: String,
    pub data: Vec<u8>,
    /// Ascender and descender in em; descent is negative.
    pub ascent: f32,
    pub descent: f32,
    font: Font,
}

impl EmbeddedFont {
    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("cannot read {}: {e}", path.display())))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded");
        let font = Self::from_bytes(stem, data)?;
        info!(font = %font.name, bytes = font.data.len(), "Loaded sheet font");
        Ok(font)
    }

    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, RenderError> {
        let font = Font::from_bytes(data.as_slice(), FontSettings::default())
            .map_err(|e| RenderError::Font(format!("cannot parse font: {e}")))?;

        let (ascent, descent) = font
            .horizontal_line_metrics(1.0)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((0.88, -0.12));

        let name: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let name = if name.is_empty() { "Embedded".to_string() } else { name };

        Ok(EmbeddedFont {
            name,
            data,
            ascent,
            descent,
            font,
        })
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        match self.font.lookup_glyph_index(ch) {
            0 => None,
            id => Some(id),
        }
    }

    fn encode(&self, ch: char) -> Option<EncodedGlyph> {
        let id = self.glyph_id(ch)?;
        let advance_em = self.font.metrics_indexed(id, 1000.0).advance_width / 1000.0;
        Some(EncodedGlyph {
            bytes: id.to_be_bytes().to_vec(),
            advance_em,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builtin Helvetica metrics
// ────────────────────────────────────────────────────────────────────────────

/// Static advance-width table for the standard Helvetica font.
///
/// `widths[i]` = width of ASCII character `(i + 32)`, covering 0x20 (space)
/// through 0x7E (~). Latin-1 characters above 0x7E fall back to
/// `average_char_width`.
pub struct BuiltinMetrics {
    widths: [f32; 95],
    pub average_char_width: f32,
    pub cap_height: f32,
}

impl BuiltinMetrics {
    /// WinAnsi covers ASCII and, for U+00A0..=U+00FF, Latin-1 at the same byte.
    fn encode(&self, ch: char) -> Option<EncodedGlyph> {
        let code = ch as u32;
        let advance_em = match code {
            0x20..=0x7E => self.widths[code as usize - 32],
            0xA0..=0xFF => self.average_char_width,
            _ => return None,
        };
        Some(EncodedGlyph {
            bytes: vec![code as u8],
            advance_em,
        })
    }
}

pub static HELVETICA: BuiltinMetrics = BuiltinMetrics {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    cap_height: 0.718,
};

/// Three-glyph TrueType font: `.notdef`, `'A'` (gid 1, 600 units) and
/// `'永'` (gid 2, 1000 units) at 1000 units per em, no outlines.
#[cfg(test)]
pub(crate) fn fixture_font() -> EmbeddedFont {
    let data = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/gridsheet-test.ttf"));
    EmbeddedFont::from_bytes("Gridsheet-Test", data.to_vec()).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
