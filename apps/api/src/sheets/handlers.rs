//! Axum route handlers for the Sheet API.

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::layout::{
    analyze_document, default_grid_size, generate_document, Document, EmptyPagePolicy,
    GridSize, LastPagePadding, PageFill, PageSize, PaginationOptions,
};
use crate::render::{render_page_svg, render_pdf, SheetStyle};
use crate::sheets::upload::{read_upload, UploadedText};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Text plus layout choices shared by every sheet request.
/// Missing fields fall back to the service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetInput {
    pub text: String,
    #[serde(default)]
    pub page_size: Option<PageSize>,
    #[serde(default)]
    pub empty_pages: Option<EmptyPagePolicy>,
    #[serde(default)]
    pub padding: Option<LastPagePadding>,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub document: Document,
    pub fill: Vec<PageFill>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub input: SheetInput,
    #[serde(default)]
    pub style: SheetStyle,
    #[serde(default)]
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(flatten)]
    pub input: SheetInput,
    #[serde(default)]
    pub style: SheetStyle,
}

#[derive(Debug, Serialize)]
pub struct PageSizeInfo {
    pub size: PageSize,
    pub width_mm: u32,
    pub height_mm: u32,
    pub columns: u32,
    pub rows: u32,
    pub grid: GridSize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/page-sizes
///
/// Lists the supported paper sizes with their grid dimensions.
pub async fn handle_page_sizes() -> Json<Vec<PageSizeInfo>> {
    let sizes = PageSize::ALL
        .iter()
        .map(|size| {
            let config = size.config();
            PageSizeInfo {
                size: *size,
                width_mm: config.width_mm,
                height_mm: config.height_mm,
                columns: config.columns,
                rows: config.rows,
                grid: default_grid_size(config),
            }
        })
        .collect();
    Json(sizes)
}

/// POST /api/v1/sheets/layout
///
/// Lays out the text and returns the page/cell model with a fill report.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(input): Json<SheetInput>,
) -> Result<Json<LayoutResponse>, AppError> {
    let document = build_document(&state, &input)?;
    let fill = analyze_document(&document);
    Ok(Json(LayoutResponse { document, fill }))
}

/// POST /api/v1/sheets/preview
///
/// Renders one page of the laid-out text as SVG.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Response, AppError> {
    let document = build_document(&state, &request.input)?;
    let svg = render_page_svg(&document, request.page, &request.style)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// POST /api/v1/sheets/export
///
/// Lays out the text and returns the whole sheet as a PDF attachment.
/// Rendering is CPU-bound and runs on the blocking pool.
pub async fn handle_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let document = build_document(&state, &request.input)?;

    let started = Instant::now();
    let pages = document.pages.len();
    let document_id = document.id;
    let fonts = state.fonts.clone();
    let style = request.style;

    let pdf = tokio::task::spawn_blocking(move || render_pdf(&document, &style, &fonts))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF export: {e}")))??;

    info!(
        document = %document_id,
        pages,
        bytes = pdf.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Exported sheet PDF"
    );

    let disposition = format!("attachment; filename=\"{}\"", state.config.export_filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(pdf),
    )
        .into_response())
}

/// POST /api/v1/sheets/upload
///
/// Accepts a multipart `file` field holding a `.txt` or `.docx` file and returns its text.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadedText>, AppError> {
    let uploaded = read_upload(multipart, state.config.max_upload_bytes).await?;
    info!(file = %uploaded.file_name, bytes = uploaded.bytes, "Accepted text upload");
    Ok(Json(uploaded))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Resolves request options against the configured defaults and lays out the text.
pub(crate) fn build_document(state: &AppState, input: &SheetInput) -> Result<Document, AppError> {
    let defaults = state.config.pagination;
    let options = PaginationOptions {
        empty_pages: input.empty_pages.unwrap_or(defaults.empty_pages),
        padding: input.padding.unwrap_or(defaults.padding),
    };
    let size = input.page_size.unwrap_or(state.config.default_page_size);
    Ok(generate_document(&input.text, size, &options)?)
}
