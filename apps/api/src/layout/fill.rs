//! Page Fill Analysis: reports how much of each page's grid is used.
//!
//! # Verdicts
//! - `Full`     → every grid slot holds a character
//! - `Partial`  → some slots are blank or unused (normally only the last page)
//! - `Overfull` → more cells than physical slots; only reachable when newlines
//!   keep the row counter from advancing
//! - `Empty`    → page was opened but holds no characters

use serde::{Deserialize, Serialize};

use crate::layout::page_config::PageConfig;
use crate::layout::paginate::{Document, Page};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFillVerdict {
    Full,
    Partial,
    Overfull,
    Empty,
}

/// Usage summary for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFill {
    pub page: usize,
    /// Cells holding a character.
    pub glyphs: usize,
    /// Cells in the page's sequence, padding included.
    pub cells_used: usize,
    pub capacity: usize,
    /// Grid rows the cell sequence spans when placed in flow order.
    pub rows_used: usize,
    /// `glyphs / capacity`; above 1.0 for overfull pages.
    pub fill_ratio: f32,
    pub verdict: PageFillVerdict,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Analyzes one page against the grid capacity of `config`.
pub fn analyze_page(page: &Page, config: &PageConfig) -> PageFill {
    let capacity = config.capacity();
    let glyphs = page.glyph_count();
    let cells_used = page.cells.len();
    let rows_used = cells_used.div_ceil(config.columns as usize);

    let verdict = if glyphs == 0 {
        PageFillVerdict::Empty
    } else if cells_used > capacity {
        PageFillVerdict::Overfull
    } else if glyphs == capacity {
        PageFillVerdict::Full
    } else {
        PageFillVerdict::Partial
    };

    PageFill {
        page: page.index,
        glyphs,
        cells_used,
        capacity,
        rows_used,
        fill_ratio: glyphs as f32 / capacity as f32,
        verdict,
    }
}

/// Analyzes every page of a document, in page order.
pub fn analyze_document(document: &Document) -> Vec<PageFill> {
    document
        .pages
        .iter()
        .map(|page| analyze_page(page, &document.config))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::grid::GridSize;
    use crate::layout::page_config::PageSize;
    use crate::layout::paginate::{
        generate_document, paginate, EmptyPagePolicy, LastPagePadding, PaginationOptions,
    };

    fn make_config() -> PageConfig {
        PageConfig::new(PageSize::A4, 210, 297, 2, 2)
    }

    fn pages_for(text: &str, options: &PaginationOptions) -> Vec<Page> {
        paginate(text, &make_config(), GridSize::square(10), options)
    }

    #[test]
    fn test_full_page() {
        let pages = pages_for("ABCD", &PaginationOptions::default());
        let fill = analyze_page(&pages[0], &make_config());
        assert_eq!(fill.verdict, PageFillVerdict::Full);
        assert_eq!(fill.rows_used, 2);
        assert!((fill.fill_ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_last_page() {
        let pages = pages_for("ABCDE", &PaginationOptions::default());
        let fill = analyze_page(&pages[1], &make_config());
        assert_eq!(fill.verdict, PageFillVerdict::Partial);
        assert_eq!(fill.glyphs, 1);
        assert_eq!(fill.rows_used, 1);
        assert!((fill.fill_ratio - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_padding_counts_as_cells_not_glyphs() {
        let options = PaginationOptions {
            padding: LastPagePadding::Page,
            ..Default::default()
        };
        let pages = pages_for("A", &options);
        let fill = analyze_page(&pages[0], &make_config());
        assert_eq!(fill.cells_used, 4);
        assert_eq!(fill.glyphs, 1);
        assert_eq!(fill.verdict, PageFillVerdict::Partial);
    }

    #[test]
    fn test_overfull_page_from_newlines() {
        let pages = pages_for("A\nB\nC\nD\nE", &PaginationOptions::default());
        let fill = analyze_page(&pages[0], &make_config());
        assert_eq!(fill.verdict, PageFillVerdict::Overfull);
        assert_eq!(fill.rows_used, 3);
        assert!(fill.fill_ratio > 1.0);
    }

    #[test]
    fn test_empty_page_verdict() {
        let options = PaginationOptions {
            empty_pages: EmptyPagePolicy::Emit,
            ..Default::default()
        };
        let pages = pages_for("A#\n#B", &options);
        let fill = analyze_page(&pages[1], &make_config());
        assert_eq!(fill.verdict, PageFillVerdict::Empty);
        assert_eq!(fill.rows_used, 0);
    }

    #[test]
    fn test_analyze_document_covers_every_page() {
        let doc = generate_document(&"书".repeat(200), PageSize::B5, &PaginationOptions::default())
            .unwrap();
        let report = analyze_document(&doc);
        assert_eq!(report.len(), doc.pages.len());
        assert_eq!(report[0].verdict, PageFillVerdict::Full);
        assert_eq!(report.last().unwrap().verdict, PageFillVerdict::Partial);
        assert!(report.iter().enumerate().all(|(i, f)| f.page == i));
    }
}
