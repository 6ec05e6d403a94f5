//! Square cell size derived from a page configuration.

use serde::{Deserialize, Serialize};

use crate::layout::page_config::PageConfig;

/// Space left free around the grid block, summed over both sides (mm).
pub const PAGE_MARGIN_MM: u32 = 20;

/// Gap between two adjacent cells (mm).
pub const CELL_GAP_MM: u32 = 2;

/// Side length of every cell in a generation run. Always square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width_mm: u32,
    pub height_mm: u32,
}

impl GridSize {
    pub fn square(side_mm: u32) -> Self {
        GridSize {
            width_mm: side_mm,
            height_mm: side_mm,
        }
    }

    pub fn side_mm(&self) -> u32 {
        self.width_mm
    }
}

/// Computes the largest whole-millimetre square cell such that `columns` cells
/// plus `columns - 1` gaps fit in `width - margin`, and `rows` cells plus
/// `rows - 1` gaps fit in `height - margin`.
///
/// Saturates at zero when the margin and gaps alone exceed the page.
pub fn compute_grid_size(config: &PageConfig, margin_mm: u32, gap_mm: u32) -> GridSize {
    let max_width = axis_max(config.width_mm, config.columns, margin_mm, gap_mm);
    let max_height = axis_max(config.height_mm, config.rows, margin_mm, gap_mm);
    GridSize::square(max_width.min(max_height))
}

/// Grid size with the standard margin and gap constants.
pub fn default_grid_size(config: &PageConfig) -> GridSize {
    compute_grid_size(config, PAGE_MARGIN_MM, CELL_GAP_MM)
}

/// Width of `count` cells plus the gaps between them (mm).
pub fn span_mm(count: u32, side_mm: u32, gap_mm: u32) -> u32 {
    count * side_mm + count.saturating_sub(1) * gap_mm
}

fn axis_max(extent_mm: u32, count: u32, margin_mm: u32, gap_mm: u32) -> u32 {
    let gaps = gap_mm * count.saturating_sub(1);
    // Integer division floors, matching the whole-millimetre cell size.
    extent_mm.saturating_sub(margin_mm).saturating_sub(gaps) / count
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
