//! Placement of grid cells on the physical page.
//!
//! Coordinates are millimetres with the origin at the top-left corner of the
//! page and y growing downwards. The PDF writer flips y itself.

use crate::layout::{span_mm, Page, PageConfig, CELL_GAP_MM};
use crate::render::style::GridStyle;

/// Points per millimetre (1 pt = 1/72 in).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// A square cell on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub side: f32,
}

impl CellRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.side / 2.0, self.y + self.side / 2.0)
    }
}

/// A straight guide line inside a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One grid slot and the character drawn in it, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedCell {
    pub rect: CellRect,
    pub ch: Option<char>,
}

/// Everything a renderer draws for one page.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub page_index: usize,
    pub width_mm: f32,
    pub height_mm: f32,
    pub slots: Vec<PlacedCell>,
    /// Cells that fall below the last physical row and are not drawn.
    pub clipped: usize,
}

/// Grid block centered on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub side_mm: f32,
    pub gap_mm: f32,
    pub columns: usize,
    pub rows: usize,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl SheetGeometry {
    pub fn new(config: &PageConfig, side_mm: u32) -> Self {
        let block_w = span_mm(config.columns, side_mm, CELL_GAP_MM) as f32;
        let block_h = span_mm(config.rows, side_mm, CELL_GAP_MM) as f32;
        let width_mm = config.width_mm as f32;
        let height_mm = config.height_mm as f32;
        SheetGeometry {
            width_mm,
            height_mm,
            side_mm: side_mm as f32,
            gap_mm: CELL_GAP_MM as f32,
            columns: config.columns as usize,
            rows: config.rows as usize,
            origin_x: (width_mm - block_w) / 2.0,
            origin_y: (height_mm - block_h) / 2.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Rectangle of the slot at flow position `slot`, or `None` past the last row.
    pub fn slot_rect(&self, slot: usize) -> Option<CellRect> {
        let row = slot / self.columns;
        if row >= self.rows {
            return None;
        }
        let col = slot % self.columns;
        let pitch = self.side_mm + self.gap_mm;
        Some(CellRect {
            x: self.origin_x + col as f32 * pitch,
            y: self.origin_y + row as f32 * pitch,
            side: self.side_mm,
        })
    }

    /// Places a page's cells into the grid. Every physical slot is returned,
    /// blank where the page has no cell.
    pub fn plan_page(&self, page: &Page) -> PagePlan {
        let slots = (0..self.capacity())
            .filter_map(|slot| {
                self.slot_rect(slot).map(|rect| PlacedCell {
                    rect,
                    ch: page.cells.get(slot).and_then(|c| c.ch),
                })
            })
            .collect();
        PagePlan {
            page_index: page.index,
            width_mm: self.width_mm,
            height_mm: self.height_mm,
            slots,
            clipped: page.cells.len().saturating_sub(self.capacity()),
        }
    }
}

/// Guide lines for one cell in the given style. The cell border is not included.
pub fn guide_segments(rect: &CellRect, style: GridStyle) -> Vec<Segment> {
    let guides = style.guides();
    let (cx, cy) = rect.center();
    let right = rect.x + rect.side;
    let bottom = rect.y + rect.side;
    let mut segments = Vec::with_capacity(4);

    if guides.vertical {
        segments.push(Segment { x1: cx, y1: rect.y, x2: cx, y2: bottom });
    }
    if guides.horizontal {
        segments.push(Segment { x1: rect.x, y1: cy, x2: right, y2: cy });
    }
    if guides.diagonals {
        segments.push(Segment { x1: rect.x, y1: rect.y, x2: right, y2: bottom });
        segments.push(Segment { x1: right, y1: rect.y, x2: rect.x, y2: bottom });
    }
    segments
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
