//! PDF export: one physical page per laid-out page.
//!
//! Each page is drawn as vector content: cell borders and guide lines in the
//! grid color, then one glyph centered in every filled cell. Opacity goes
//! through two ExtGState dictionaries (`GsGrid`, `GsGlyph`); hollow text uses
//! the stroke-only text rendering mode. Pages are rendered strictly in order.

use chrono::{Datelike, Timelike};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, TextRenderingMode};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::{debug, warn};

use crate::layout::Document;
use crate::render::font::{EmbeddedFont, FontSource};
use crate::render::geometry::{guide_segments, mm_to_pt, PagePlan, SheetGeometry};
use crate::render::style::SheetStyle;
use crate::render::RenderError;

const FONT_NAME: Name<'static> = Name(b"F1");
const GS_GRID: Name<'static> = Name(b"GsGrid");
const GS_GLYPH: Name<'static> = Name(b"GsGlyph");

const BORDER_WIDTH_PT: f32 = 0.75;
const GUIDE_WIDTH_PT: f32 = 0.5;
const HOLLOW_STROKE_PT: f32 = 0.8;
const DEFLATE_LEVEL: u8 = 6;

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Renders every page of `document` into a single PDF file.
pub fn render_pdf(
    document: &Document,
    style: &SheetStyle,
    fonts: &FontSource,
) -> Result<Vec<u8>, RenderError> {
    style.validate()?;
    if document.pages.is_empty() {
        return Err(RenderError::EmptyDocument);
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let grid_gs_id = alloc();
    let glyph_gs_id = alloc();
    let font_id = alloc();
    let font_refs = match fonts {
        FontSource::Builtin => None,
        FontSource::Embedded(_) => Some((alloc(), alloc(), alloc())),
    };

    let geometry = SheetGeometry::new(&document.config, document.grid.side_mm());
    let page_w_pt = mm_to_pt(geometry.width_mm);
    let page_h_pt = mm_to_pt(geometry.height_mm);

    let n = document.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let mut missing_glyphs = 0usize;
    for (i, page) in document.pages.iter().enumerate() {
        let plan = geometry.plan_page(page);
        if plan.clipped > 0 {
            warn!(
                page = plan.page_index,
                clipped = plan.clipped,
                "Page holds more cells than the physical grid; extra cells are not drawn"
            );
        }

        let (content, missing) = draw_page(&plan, style, fonts);
        missing_glyphs += missing;

        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), DEFLATE_LEVEL);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        debug!(page = i, bytes = compressed.len(), "Rendered PDF page");
    }

    if missing_glyphs > 0 {
        warn!(
            missing = missing_glyphs,
            font = %fonts.describe(),
            "Characters not covered by the sheet font were left blank"
        );
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_w_pt, page_h_pt))
            .parent(pages_id)
            .contents(content_ids[i]);
        {
            let mut resources = page.resources();
            resources.fonts().pair(FONT_NAME, font_id);
            resources
                .ext_g_states()
                .pair(GS_GRID, grid_gs_id)
                .pair(GS_GLYPH, glyph_gs_id);
        }
    }

    pdf.ext_graphics(grid_gs_id)
        .stroking_alpha(style.grid_alpha())
        .non_stroking_alpha(style.grid_alpha());
    pdf.ext_graphics(glyph_gs_id)
        .stroking_alpha(style.font_alpha())
        .non_stroking_alpha(style.font_alpha());

    match (fonts, font_refs) {
        (FontSource::Embedded(font), Some((cid_id, descriptor_id, file_id))) => {
            write_embedded_font(&mut pdf, font, font_id, cid_id, descriptor_id, file_id);
        }
        _ => {
            pdf.type1_font(font_id)
                .base_font(Name(b"Helvetica"))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }
    }

    let created = document.generated_at;
    pdf.document_info(info_id)
        .title(TextStr("Calligraphy practice sheet"))
        .producer(TextStr(concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))))
        .creation_date(
            Date::new(created.year().clamp(0, 9999) as u16)
                .month(created.month() as u8)
                .day(created.day() as u8)
                .hour(created.hour() as u8)
                .minute(created.minute() as u8)
                .second(created.second() as u8),
        );

    Ok(pdf.finish())
}

// ────────────────────────────────────────────────────────────────────────────
// Page content
// ────────────────────────────────────────────────────────────────────────────

/// Draws one page. Returns the content stream and the number of characters
/// the font could not show.
fn draw_page(plan: &PagePlan, style: &SheetStyle, fonts: &FontSource) -> (Content, usize) {
    let page_h_pt = mm_to_pt(plan.height_mm);
    // Top-left millimetres to bottom-left points.
    let to_pt = |x: f32, y: f32| (mm_to_pt(x), page_h_pt - mm_to_pt(y));

    let mut content = Content::new();

    // Grid: borders and guides.
    let (r, g, b) = style.grid_color.unit();
    content.save_state();
    content.set_parameters(GS_GRID);
    content.set_stroke_rgb(r, g, b);
    for slot in &plan.slots {
        let rect = slot.rect;
        let (x, y_bottom) = to_pt(rect.x, rect.y + rect.side);
        let side = mm_to_pt(rect.side);
        content.set_line_width(BORDER_WIDTH_PT);
        content.rect(x, y_bottom, side, side);
        content.stroke();

        content.set_line_width(GUIDE_WIDTH_PT);
        for seg in guide_segments(&rect, style.grid_style) {
            let (x1, y1) = to_pt(seg.x1, seg.y1);
            let (x2, y2) = to_pt(seg.x2, seg.y2);
            content.move_to(x1, y1);
            content.line_to(x2, y2);
        }
        content.stroke();
    }
    content.restore_state();

    // Glyphs.
    let (r, g, b) = style.font_color.unit();
    let mut missing = 0usize;
    content.save_state();
    content.set_parameters(GS_GLYPH);
    if style.hollow {
        content.set_stroke_rgb(r, g, b);
        content.set_line_width(HOLLOW_STROKE_PT);
    } else {
        content.set_fill_rgb(r, g, b);
    }

    for slot in &plan.slots {
        let Some(ch) = slot.ch else { continue };
        let Some(glyph) = fonts.encode(ch) else {
            missing += 1;
            continue;
        };

        let size_pt = mm_to_pt(style.glyph_size_mm(slot.rect.side));
        let (cx, cy) = slot.rect.center();
        let (cx_pt, cy_pt) = to_pt(cx, cy);
        let x = cx_pt - glyph.advance_em * size_pt / 2.0;
        let y = cy_pt - fonts.middle_em() * size_pt;

        content.begin_text();
        content.set_font(FONT_NAME, size_pt);
        if style.hollow {
            content.set_text_rendering_mode(TextRenderingMode::Stroke);
        }
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
        content.show(Str(&glyph.bytes));
        content.end_text();
    }
    content.restore_state();

    (content, missing)
}

// ────────────────────────────────────────────────────────────────────────────
// Font objects
// ────────────────────────────────────────────────────────────────────────────

fn write_embedded_font(
    pdf: &mut Pdf,
    font: &EmbeddedFont,
    type0_id: Ref,
    cid_id: Ref,
    descriptor_id: Ref,
    file_id: Ref,
) {
    let base = Name(font.name.as_bytes());

    pdf.type0_font(type0_id)
        .base_font(base)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_id);

    pdf.cid_font(cid_id)
        .subtype(CidFontType::Type2)
        .base_font(base)
        .system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        })
        .font_descriptor(descriptor_id)
        .default_width(1000.0)
        .cid_to_gid_map_predefined(Name(b"Identity"));

    let ascent = font.ascent * 1000.0;
    let descent = font.descent * 1000.0;
    pdf.font_descriptor(descriptor_id)
        .name(base)
        .flags(FontFlags::SYMBOLIC)
        .bbox(Rect::new(0.0, descent, 1000.0, ascent))
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(ascent)
        .stem_v(80.0)
        .font_file2(file_id);

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&font.data, DEFLATE_LEVEL);
    pdf.stream(file_id, &compressed)
        .filter(Filter::FlateDecode)
        .pair(Name(b"Length1"), font.data.len() as i32);
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{generate_document, PageSize, PaginationOptions};
    use crate::render::font::fixture_font;
    use crate::render::style::GridStyle;
    use std::sync::Arc;

    fn make_document(text: &str, size: PageSize) -> Document {
        generate_document(text, size, &PaginationOptions::default()).unwrap()
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_pdf_has_header_and_trailer() {
        let bytes = render_pdf(&make_document("Hello", PageSize::A4), &SheetStyle::default(), &FontSource::Builtin)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.ends_with(b"%%EOF") || bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_one_pdf_page_per_document_page() {
        let doc = make_document("AB#CD#EF", PageSize::A4);
        assert_eq!(doc.pages.len(), 3);
        let bytes = render_pdf(&doc, &SheetStyle::default(), &FontSource::Builtin).unwrap();
        let page_objects = count(&bytes, b"/Type /Page") - count(&bytes, b"/Type /Pages");
        assert_eq!(page_objects, 3);
        assert_eq!(count(&bytes, b"/Count 3"), 1);
    }

    #[test]
    fn test_media_box_matches_paper_size() {
        let bytes = render_pdf(&make_document("A", PageSize::A3), &SheetStyle::default(), &FontSource::Builtin)
            .unwrap();
        // 297 mm × 420 mm in points.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 841."));
        assert!(text.contains(" 1190."));
    }

    #[test]
    fn test_builtin_font_and_alpha_states_written() {
        let style = SheetStyle {
            grid_opacity: 50,
            font_opacity: 80,
            grid_style: GridStyle::Rice,
            ..Default::default()
        };
        let bytes = render_pdf(&make_document("Hi", PageSize::B5), &style, &FontSource::Builtin).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/CA 0.5"));
        assert!(text.contains("/ca 0.8"));
    }

    #[test]
    fn test_cjk_without_font_still_renders_grid() {
        let bytes = render_pdf(&make_document("永字八法", PageSize::A4), &SheetStyle::default(), &FontSource::Builtin);
        assert!(bytes.is_ok());
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let mut doc = make_document("A", PageSize::A4);
        doc.pages.clear();
        let err = render_pdf(&doc, &SheetStyle::default(), &FontSource::Builtin).unwrap_err();
        assert!(matches!(err, RenderError::EmptyDocument));
    }

    #[test]
    fn test_invalid_style_is_rejected_before_rendering() {
        let style = SheetStyle {
            grid_opacity: 0,
            ..Default::default()
        };
        let err = render_pdf(&make_document("A", PageSize::A4), &style, &FontSource::Builtin).unwrap_err();
        assert!(matches!(err, RenderError::Style(_)));
    }

    #[test]
    fn test_draw_page_counts_missing_glyphs() {
        let doc = make_document("A永B", PageSize::A4);
        let geometry = SheetGeometry::new(&doc.config, doc.grid.side_mm());
        let plan = geometry.plan_page(&doc.pages[0]);
        let (_, missing) = draw_page(&plan, &SheetStyle::default(), &FontSource::Builtin);
        assert_eq!(missing, 1);
    }

    #[test]
    fn test_hollow_text_uses_stroke_mode() {
        let doc = make_document("A", PageSize::A4);
        let geometry = SheetGeometry::new(&doc.config, doc.grid.side_mm());
        let plan = geometry.plan_page(&doc.pages[0]);
        let style = SheetStyle {
            hollow: true,
            ..Default::default()
        };
        let (content, _) = draw_page(&plan, &style, &FontSource::Builtin);
        let raw = content.finish();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("1 Tr"));
        assert!(text.contains("(A) Tj"));
    }

    #[test]
    fn test_embedded_font_writes_cid_font_objects() {
        let fonts = FontSource::Embedded(Arc::new(fixture_font()));
        let bytes = render_pdf(&make_document("永A", PageSize::A4), &SheetStyle::default(), &fonts).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type0"));
        assert!(text.contains("/CIDFontType2"));
        assert!(text.contains("/Identity-H"));
        assert!(text.contains("/FontFile2"));
        assert!(text.contains("/Length1 256"));
        assert!(text.contains("/BaseFont /GridsheetTest"));
        assert!(!text.contains("/Helvetica"));
    }

    #[test]
    fn test_embedded_font_draws_mapped_glyph() {
        let fonts = FontSource::Embedded(Arc::new(fixture_font()));
        let doc = make_document("永", PageSize::A4);
        let geometry = SheetGeometry::new(&doc.config, doc.grid.side_mm());
        let plan = geometry.plan_page(&doc.pages[0]);
        let (content, missing) = draw_page(&plan, &SheetStyle::default(), &fonts);
        assert_eq!(missing, 0);
        let raw = content.finish();
        assert_eq!(count(&raw, b" Tj"), 1);
        assert!(count(&raw, b"/F1 ") >= 1);
    }

    #[test]
    fn test_embedded_font_counts_unmapped_characters() {
        let fonts = FontSource::Embedded(Arc::new(fixture_font()));
        let doc = make_document("A永Z字", PageSize::A4);
        let geometry = SheetGeometry::new(&doc.config, doc.grid.side_mm());
        let plan = geometry.plan_page(&doc.pages[0]);
        let (_, missing) = draw_page(&plan, &SheetStyle::default(), &fonts);
        assert_eq!(missing, 2);
    }
}
