//! SVG preview of a single page.
//!
//! The document is sized in millimetres so it prints at the paper's physical
//! size. Glyphs are emitted as `<text>` in the style's font family and left to
//! the viewer's font stack, so any script renders.

use std::fmt::Write;

use crate::layout::Document;
use crate::render::geometry::{guide_segments, SheetGeometry};
use crate::render::style::SheetStyle;
use crate::render::RenderError;

/// Stroke widths in millimetres.
const BORDER_WIDTH_MM: f32 = 0.26;
const GUIDE_WIDTH_MM: f32 = 0.18;
const HOLLOW_STROKE_MM: f32 = 0.3;

/// Renders page `page_index` of `document` as a complete SVG document.
pub fn render_page_svg(
    document: &Document,
    page_index: usize,
    style: &SheetStyle,
) -> Result<String, RenderError> {
    style.validate()?;
    let page = document
        .pages
        .get(page_index)
        .ok_or(RenderError::PageOutOfRange {
            page: page_index,
            pages: document.pages.len(),
        })?;

    let geometry = SheetGeometry::new(&document.config, document.grid.side_mm());
    let plan = geometry.plan_page(page);

    let mut svg = String::with_capacity(64 * plan.slots.len());
    // Writing into a String cannot fail.
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">"#,
        w = plan.width_mm,
        h = plan.height_mm,
    );
    svg.push('\n');
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
        plan.width_mm, plan.height_mm
    );

    let _ = writeln!(
        svg,
        r#"<g fill="none" stroke="{}" stroke-opacity="{}">"#,
        style.grid_color,
        style.grid_alpha()
    );
    for slot in &plan.slots {
        let rect = slot.rect;
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{s}" height="{s}" stroke-width="{BORDER_WIDTH_MM}"/>"#,
            rect.x,
            rect.y,
            s = rect.side,
        );
        for seg in guide_segments(&rect, style.grid_style) {
            let _ = writeln!(
                svg,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="{GUIDE_WIDTH_MM}"/>"#,
                seg.x1, seg.y1, seg.x2, seg.y2
            );
        }
    }
    svg.push_str("</g>\n");

    let paint = if style.hollow {
        format!(
            r#"fill="none" stroke="{}" stroke-width="{HOLLOW_STROKE_MM}""#,
            style.font_color
        )
    } else {
        format!(r#"fill="{}""#, style.font_color)
    };
    let _ = writeln!(
        svg,
        r#"<g font-family="{}" text-anchor="middle" dominant-baseline="central" opacity="{}" {paint}>"#,
        style.font_family.trim(),
        style.font_alpha()
    );
    for slot in &plan.slots {
        let Some(glyph) = slot.ch.and_then(escape_xml) else { continue };
        let (cx, cy) = slot.rect.center();
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="{cy}" font-size="{}">{glyph}</text>"#,
            style.glyph_size_mm(slot.rect.side),
        );
    }
    svg.push_str("</g>\n</svg>\n");

    Ok(svg)
}

/// Escapes one cell character for XML text. Control characters have no
/// glyph and most are not legal XML, so their cells stay blank.
fn escape_xml(ch: char) -> Option<String> {
    let escaped = match ch {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        '\'' => "&apos;".to_string(),
        c if c.is_control() => return None,
        c => c.to_string(),
    };
    Some(escaped)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
