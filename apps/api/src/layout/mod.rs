// Layout engine: paper table, grid sizing, pagination, page fill analysis.
// Pure and synchronous. Nothing in here knows about HTTP or rendering.

pub mod fill;
pub mod grid;
pub mod page_config;
pub mod paginate;

use thiserror::Error;

// Re-export the public API consumed by the sheet handlers and the renderers.
pub use fill::{analyze_document, PageFill, PageFillVerdict};
pub use grid::{default_grid_size, span_mm, GridSize, CELL_GAP_MM, PAGE_MARGIN_MM};
pub use page_config::{PageConfig, PageSize};
pub use paginate::{
    generate_document, normalize_line_endings, Cell, CellKey, Document, EmptyPagePolicy,
    LastPagePadding, Page, PaginationOptions,
};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("text cannot be empty")]
    EmptyText,

    #[error("unknown page size '{0}'")]
    UnknownPageSize(String),

    #[error("invalid layout option: {0}")]
    InvalidOption(String),
}
