//! Paper sizes and their fixed grid dimensions.
//!
//! Every sheet is laid out on one of a small, closed set of paper sizes. Each
//! size carries its physical dimensions (millimetres) and the number of grid
//! columns and rows that fit on one page. The table is static: a `PageConfig`
//! can only be obtained through `PageSize::config`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

// ────────────────────────────────────────────────────────────────────────────
// Page size enum
// ────────────────────────────────────────────────────────────────────────────

/// The supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A3,
    B5,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::A4, PageSize::A3, PageSize::B5];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
            PageSize::B5 => "B5",
        }
    }

    /// Returns the static page configuration for this paper size.
    pub fn config(&self) -> &'static PageConfig {
        match self {
            PageSize::A4 => &A4_CONFIG,
            PageSize::A3 => &A3_CONFIG,
            PageSize::B5 => &B5_CONFIG,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSize {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A4" => Ok(PageSize::A4),
            "A3" => Ok(PageSize::A3),
            "B5" => Ok(PageSize::B5),
            _ => Err(LayoutError::UnknownPageSize(s.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Physical page dimensions and grid capacity for one paper size.
///
/// `columns` and `rows` are always non-zero; `rows` is a soft cap that
/// triggers a new page during pagination rather than truncating input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub size: PageSize,
    pub width_mm: u32,
    pub height_mm: u32,
    pub columns: u32,
    pub rows: u32,
}

impl PageConfig {
    /// Builds a page configuration.
    ///
    /// # Panics
    /// Panics when `columns` or `rows` is zero. A grid without cells is a
    /// programming error, never a runtime condition.
    pub const fn new(size: PageSize, width_mm: u32, height_mm: u32, columns: u32, rows: u32) -> Self {
        assert!(columns > 0, "page config must have at least one column");
        assert!(rows > 0, "page config must have at least one row");
        PageConfig {
            size,
            width_mm,
            height_mm,
            columns,
            rows,
        }
    }

    /// Number of cells that fit on one page without overflowing the row cap.
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

static A4_CONFIG: PageConfig = PageConfig::new(PageSize::A4, 210, 297, 10, 15);
static A3_CONFIG: PageConfig = PageConfig::new(PageSize::A3, 297, 420, 14, 20);
static B5_CONFIG: PageConfig = PageConfig::new(PageSize::B5, 176, 250, 8, 13);

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
