// Presentation and export: draws laid-out pages as PDF or SVG.
// PDF export is CPU-bound; callers run it inside tokio::task::spawn_blocking.

pub mod font;
pub mod geometry;
pub mod pdf;
pub mod style;
pub mod svg;

use thiserror::Error;

pub use font::{EmbeddedFont, FontSource};
pub use pdf::render_pdf;
pub use style::{GridStyle, Rgb, SheetStyle};
pub use svg::render_page_svg;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("invalid font family '{0}'")]
    InvalidFontFamily(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Style(#[from] StyleError),

    #[error("text has no characters to draw")]
    EmptyDocument,

    #[error("page {page} does not exist (document has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },

    #[error("font error: {0}")]
    Font(String),
}
