//! Pagination: turns a character stream into pages of grid cells.
//!
//! # Scan rules (evaluated per character, in order)
//! 1. `' '` is dropped without touching the row/column position.
//! 2. A page is opened when none is open, when `'#'` arrives, or when the row
//!    counter has reached the page's row cap. `'#'` only closes the open page
//!    and is consumed; the next real character opens the following page. An
//!    overflowing character is not consumed by the trigger: it becomes the
//!    first cell of the new page.
//! 3. `'\n'` resets the column to zero but leaves the row counter alone, so
//!    soft-wrapped input never paginates early.
//! 4. Anything else is appended as a cell; a full row wraps the column and
//!    bumps the row counter.
//!
//! `\r\n` and lone `\r` are folded into `'\n'` before the scan.
//!
//! The scan is a fold over an owned `ScanState` accumulator. Finalization
//! (empty-page policy, last-page padding, cell keys) happens afterwards.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::layout::grid::{default_grid_size, GridSize};
use crate::layout::page_config::{PageConfig, PageSize};
use crate::layout::LayoutError;

/// Dropped without occupying a cell.
pub const SPACE: char = ' ';
/// Closes the current page; never occupies a cell.
pub const PAGE_BREAK: char = '#';
/// Resets the column within the current row; never occupies a cell.
pub const LINE_BREAK: char = '\n';

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Stable, position-based identity of a cell within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub page: usize,
    pub index: usize,
}

/// One grid slot. `None` is a blank cell (padding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub key: CellKey,
    #[serde(rename = "char")]
    pub ch: Option<char>,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.ch.is_none()
    }
}

/// One physical sheet's worth of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub grid: GridSize,
    pub cells: Vec<Cell>,
}

impl Page {
    /// Number of cells holding a character (blank padding excluded).
    pub fn glyph_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blank()).count()
    }
}

/// The full output of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub config: PageConfig,
    pub grid: GridSize,
    pub pages: Vec<Page>,
}

impl Document {
    /// Compares layout content only, ignoring the run id and timestamp.
    pub fn same_layout(&self, other: &Document) -> bool {
        self.config == other.config && self.grid == other.grid && self.pages == other.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

/// What to do with a page that was opened but received no cells
/// (e.g. `"\n#"` or a trailing `'\n'` after a page break).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPagePolicy {
    #[default]
    Suppress,
    Emit,
}

/// How the final page is completed with blank cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPagePadding {
    /// Leave the last page short.
    #[default]
    None,
    /// Pad to the next row boundary.
    Row,
    /// Pad to the page capacity.
    Page,
}

impl FromStr for EmptyPagePolicy {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suppress" => Ok(EmptyPagePolicy::Suppress),
            "emit" => Ok(EmptyPagePolicy::Emit),
            other => Err(LayoutError::InvalidOption(format!("empty page policy '{other}'"))),
        }
    }
}

impl FromStr for LastPagePadding {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(LastPagePadding::None),
            "row" => Ok(LastPagePadding::Row),
            "page" => Ok(LastPagePadding::Page),
            other => Err(LayoutError::InvalidOption(format!("last page padding '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOptions {
    pub empty_pages: EmptyPagePolicy,
    pub padding: LastPagePadding,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

/// Validates `text` and lays it out on pages of the given size.
///
/// Whitespace-only input is rejected before layout begins. The text itself is
/// scanned untrimmed.
pub fn generate_document(
    text: &str,
    size: PageSize,
    options: &PaginationOptions,
) -> Result<Document, LayoutError> {
    if text.trim().is_empty() {
        return Err(LayoutError::EmptyText);
    }

    let config = size.config();
    let grid = default_grid_size(config);
    let pages = paginate(text, config, grid, options);

    debug!(
        page_size = %size,
        grid_mm = grid.side_mm(),
        pages = pages.len(),
        "Laid out document"
    );

    Ok(Document {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        config: config.clone(),
        grid,
        pages,
    })
}

/// Runs the pagination scan and finalizes the resulting pages.
pub fn paginate(
    text: &str,
    config: &PageConfig,
    grid: GridSize,
    options: &PaginationOptions,
) -> Vec<Page> {
    let raw = normalize_line_endings(text)
        .chars()
        .fold(ScanState::default(), |state, ch| state.advance(ch, config))
        .finish();
    finalize(raw, config, grid, options)
}

/// Folds `\r\n` and lone `\r` into `'\n'`. Borrows when there is nothing to fold.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scan state
// ────────────────────────────────────────────────────────────────────────────

type RawPage = Vec<Option<char>>;

#[derive(Debug, Default)]
struct ScanState {
    pages: Vec<RawPage>,
    current: Option<RawPage>,
    row: u32,
    col: u32,
}

impl ScanState {
    fn advance(mut self, ch: char, config: &PageConfig) -> Self {
        if ch == SPACE {
            return self;
        }

        if self.current.is_none() || ch == PAGE_BREAK || self.row >= config.rows {
            self.close_page();
            if ch == PAGE_BREAK {
                return self;
            }
            self.current = Some(Vec::new());
            self.row = 0;
            self.col = 0;
        }

        if ch == LINE_BREAK {
            self.col = 0;
            return self;
        }

        self.current.get_or_insert_with(Vec::new).push(Some(ch));
        self.col += 1;
        if self.col >= config.columns {
            self.col = 0;
            self.row += 1;
        }
        self
    }

    fn close_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
    }

    fn finish(mut self) -> Vec<RawPage> {
        self.close_page();
        self.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Finalization
// ────────────────────────────────────────────────────────────────────────────

fn finalize(
    mut raw: Vec<RawPage>,
    config: &PageConfig,
    grid: GridSize,
    options: &PaginationOptions,
) -> Vec<Page> {
    if options.empty_pages == EmptyPagePolicy::Suppress {
        raw.retain(|page| !page.is_empty());
    }

    if let Some(last) = raw.last_mut() {
        let target = padded_len(last.len(), config, options.padding);
        last.resize(target, None);
    }

    raw.into_iter()
        .enumerate()
        .map(|(page_index, slots)| Page {
            index: page_index,
            grid,
            cells: slots
                .into_iter()
                .enumerate()
                .map(|(index, ch)| Cell {
                    key: CellKey {
                        page: page_index,
                        index,
                    },
                    ch,
                })
                .collect(),
        })
        .collect()
}

fn padded_len(len: usize, config: &PageConfig, padding: LastPagePadding) -> usize {
    let columns = config.columns as usize;
    let to_row = len.div_ceil(columns) * columns;
    match padding {
        LastPagePadding::None => len,
        LastPagePadding::Row => to_row,
        LastPagePadding::Page => to_row.max(config.capacity()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_config(columns: u32, rows: u32) -> PageConfig {
        PageConfig::new(PageSize::A4, 210, 297, columns, rows)
    }

    fn layout(text: &str, columns: u32, rows: u32) -> Vec<Vec<Option<char>>> {
        layout_with(text, columns, rows, &PaginationOptions::default())
    }

    fn layout_with(
        text: &str,
        columns: u32,
        rows: u32,
        options: &PaginationOptions,
    ) -> Vec<Vec<Option<char>>> {
        let config = make_config(columns, rows);
        paginate(text, &config, GridSize::square(16), options)
            .into_iter()
            .map(|p| p.cells.into_iter().map(|c| c.ch).collect())
            .collect()
    }

    fn chars(s: &str) -> Vec<Option<char>> {
        s.chars().map(Some).collect()
    }

    #[test]
    fn test_page_break_marker_splits_pages() {
        assert_eq!(layout("AB#CD", 2, 5), vec![chars("AB"), chars("CD")]);
    }

    #[test]
    fn test_newline_resets_column_not_row() {
        // A, B fill row 0; newline resets col; C, D fill row 1. One page.
        assert_eq!(layout("AB\nCD", 2, 2), vec![chars("ABCD")]);
    }

    #[test]
    fn test_carriage_returns_act_as_line_breaks() {
        assert_eq!(layout("AB\r\nCD", 3, 2), layout("AB\nCD", 3, 2));
        assert_eq!(layout("AB\rCD", 3, 2), layout("AB\nCD", 3, 2));
        assert_eq!(layout("AB\r\nCD", 3, 2), vec![chars("ABCD")]);
    }

    #[test]
    fn test_generate_never_puts_carriage_return_in_a_cell() {
        let doc = generate_document("AB\r\nCD", PageSize::A4, &PaginationOptions::default()).unwrap();
        let cells: Vec<Option<char>> = doc.pages[0].cells.iter().map(|c| c.ch).collect();
        assert_eq!(cells, chars("ABCD"));
    }

    #[test]
    fn test_normalize_borrows_clean_text() {
        assert!(matches!(normalize_line_endings("A\nB"), Cow::Borrowed("A\nB")));
        assert_eq!(normalize_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_newlines_never_paginate_early() {
        // Each line is shorter than a row, so the row counter never advances.
        let text = "A\nB\nC\nD\nE";
        assert_eq!(layout(text, 3, 1), vec![chars("ABCDE")]);
    }

    #[test]
    fn test_spaces_are_dropped() {
        assert_eq!(layout("A B", 10, 10), vec![chars("AB")]);
    }

    #[test]
    fn test_space_does_not_advance_column() {
        // If the space advanced the column, C would land on row 1 and the
        // second page would start earlier.
        assert_eq!(layout("A B C", 3, 1), vec![chars("ABC")]);
    }

    #[test]
    fn test_row_overflow_places_trigger_on_new_page() {
        assert_eq!(layout("ABC", 2, 1), vec![chars("AB"), chars("C")]);
    }

    #[test]
    fn test_consecutive_markers_create_no_blank_pages() {
        assert_eq!(layout("AB###CD", 4, 4), vec![chars("AB"), chars("CD")]);
    }

    #[test]
    fn test_marker_without_open_page_is_noop() {
        assert_eq!(layout("#AB", 4, 4), vec![chars("AB")]);
        assert_eq!(layout("AB#", 4, 4), vec![chars("AB")]);
    }

    #[test]
    fn test_only_reserved_characters_yield_no_pages() {
        assert!(layout("  # ## ", 4, 4).is_empty());
    }

    #[test]
    fn test_marker_after_full_page_does_not_add_page() {
        assert_eq!(layout("ABCD#EF", 2, 2), vec![chars("ABCD"), chars("EF")]);
    }

    #[test]
    fn test_empty_started_page_is_suppressed_by_default() {
        assert_eq!(layout("AB#\n#CD", 4, 4), vec![chars("AB"), chars("CD")]);
    }

    #[test]
    fn test_empty_started_page_emitted_when_requested() {
        let options = PaginationOptions {
            empty_pages: EmptyPagePolicy::Emit,
            ..Default::default()
        };
        assert_eq!(
            layout_with("AB#\n#CD", 4, 4, &options),
            vec![chars("AB"), vec![], chars("CD")]
        );
    }

    #[test]
    fn test_trailing_newline_after_break_is_suppressed() {
        assert_eq!(layout("AB#\n", 4, 4), vec![chars("AB")]);
    }

    #[test]
    fn test_row_padding_fills_last_row_only() {
        let options = PaginationOptions {
            padding: LastPagePadding::Row,
            ..Default::default()
        };
        let pages = layout_with("ABCDE#FG", 3, 4, &options);
        // The first page is left alone; only the final page is padded.
        assert_eq!(pages[0], chars("ABCDE"));
        assert_eq!(pages[1], vec![Some('F'), Some('G'), None]);
    }

    #[test]
    fn test_row_padding_leaves_complete_row_untouched() {
        let options = PaginationOptions {
            padding: LastPagePadding::Row,
            ..Default::default()
        };
        assert_eq!(layout_with("ABC", 3, 4, &options), vec![chars("ABC")]);
    }

    #[test]
    fn test_page_padding_fills_to_capacity() {
        let options = PaginationOptions {
            padding: LastPagePadding::Page,
            ..Default::default()
        };
        let pages = layout_with("AB", 2, 3, &options);
        assert_eq!(pages, vec![vec![Some('A'), Some('B'), None, None, None, None]]);
    }

    #[test]
    fn test_page_padding_on_overfull_page_rounds_to_row() {
        let options = PaginationOptions {
            padding: LastPagePadding::Page,
            ..Default::default()
        };
        // Newlines keep the row counter at 0, so five cells land on a 2x1 page.
        let pages = layout_with("A\nB\nC\nD\nE", 2, 1, &options);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 6);
        assert_eq!(pages[0][5], None);
    }

    #[test]
    fn test_cell_keys_are_positional() {
        let config = make_config(2, 1);
        let pages = paginate("ABC", &config, GridSize::square(10), &PaginationOptions::default());
        assert_eq!(pages[1].index, 1);
        assert_eq!(pages[1].cells[0].key, CellKey { page: 1, index: 0 });
        assert_eq!(pages[0].cells[1].key, CellKey { page: 0, index: 1 });
    }

    #[test]
    fn test_all_pages_share_grid_size() {
        let doc = generate_document(&"字".repeat(400), PageSize::A4, &PaginationOptions::default())
            .unwrap();
        assert_eq!(doc.pages.len(), 3);
        assert!(doc.pages.iter().all(|p| p.grid == doc.grid));
    }

    #[test]
    fn test_full_pages_before_last() {
        let doc = generate_document(&"永".repeat(320), PageSize::A4, &PaginationOptions::default())
            .unwrap();
        let capacity = doc.config.capacity();
        let (last, rest) = doc.pages.split_last().unwrap();
        assert!(rest.iter().all(|p| p.cells.len() == capacity));
        assert_eq!(last.cells.len(), 320 - 2 * capacity);
    }

    #[test]
    fn test_generate_rejects_blank_text() {
        let err = generate_document(" \n\t ", PageSize::A4, &PaginationOptions::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::EmptyText));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let text = "天地玄黄\n宇宙洪荒#日月盈昃 辰宿列张";
        let a = generate_document(text, PageSize::B5, &PaginationOptions::default()).unwrap();
        let b = generate_document(text, PageSize::B5, &PaginationOptions::default()).unwrap();
        assert!(a.same_layout(&b));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_options_parse_from_str() {
        assert_eq!("emit".parse::<EmptyPagePolicy>().unwrap(), EmptyPagePolicy::Emit);
        assert_eq!(" Row ".parse::<LastPagePadding>().unwrap(), LastPagePadding::Row);
        assert!(matches!(
            "sometimes".parse::<EmptyPagePolicy>(),
            Err(LayoutError::InvalidOption(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_plain_text_places_every_char(
            text in "[a-zA-Z0-9\u{4e00}-\u{4e80}]{1,400}",
            columns in 1u32..16,
            rows in 1u32..12,
        ) {
            let config = make_config(columns, rows);
            let pages = paginate(&text, &config, GridSize::square(10), &PaginationOptions::default());
            let count = text.chars().count();

            let placed: Vec<char> = pages
                .iter()
                .flat_map(|p| p.cells.iter().filter_map(|c| c.ch))
                .collect();
            prop_assert_eq!(placed, text.chars().collect::<Vec<_>>());

            let rows_used: usize = pages
                .iter()
                .map(|p| p.cells.len().div_ceil(columns as usize))
                .sum();
            prop_assert_eq!(rows_used, count.div_ceil(columns as usize));

            let capacity = config.capacity();
            for page in &pages[..pages.len() - 1] {
                prop_assert_eq!(page.cells.len(), capacity);
            }
        }

        #[test]
        fn prop_reserved_chars_never_occupy_cells(
            text in "[ab#\n ]{0,200}",
            columns in 1u32..6,
            rows in 1u32..6,
        ) {
            let config = make_config(columns, rows);
            let pages = paginate(&text, &config, GridSize::square(10), &PaginationOptions::default());
            for cell in pages.iter().flat_map(|p| &p.cells) {
                prop_assert!(matches!(cell.ch, Some('a') | Some('b')));
            }
            prop_assert!(pages.iter().all(|p| !p.cells.is_empty()));
        }
    }
}
