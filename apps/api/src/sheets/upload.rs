//! Source-text upload: size and type checks, `.txt` decoding and `.docx`
//! text extraction, line-ending cleanup.

use std::io::{Cursor, Read};

use axum::extract::Multipart;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::layout::normalize_line_endings;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Main body part of a Word document package.
const DOCX_BODY: &str = "word/document.xml";

/// Ceiling on the decompressed document body, so a small archive cannot
/// inflate without bound.
const DOCX_BODY_LIMIT: u64 = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no 'file' field in upload")]
    MissingFile,

    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("unsupported file type '{0}', only .txt and .docx files are accepted")]
    UnsupportedType(String),

    #[error("file is not valid UTF-8 text")]
    NotUtf8,

    #[error("could not read .docx file: {0}")]
    InvalidDocx(String),

    #[error("malformed upload: {0}")]
    Multipart(String),
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Text,
    Docx,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedText {
    pub file_name: String,
    pub bytes: usize,
    pub text: String,
}

/// Reads the `file` field from a multipart body, stopping as soon as the
/// size limit is exceeded.
pub async fn read_upload(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadedText, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let kind = check_file_type(&file_name)?;

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            data.extend_from_slice(&chunk);
        }

        let text = match kind {
            UploadKind::Text => decode_text(&data)?,
            UploadKind::Docx => extract_docx_text(&data)?,
        };
        debug!(file = %file_name, kind = ?kind, bytes = data.len(), "Read uploaded text");
        return Ok(UploadedText {
            file_name,
            bytes: data.len(),
            text,
        });
    }
    Err(UploadError::MissingFile)
}

/// Plain-text and Word files are accepted, by extension.
pub fn check_file_type(file_name: &str) -> Result<UploadKind, UploadError> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".txt") {
        Ok(UploadKind::Text)
    } else if lower.ends_with(".docx") {
        Ok(UploadKind::Docx)
    } else {
        Err(UploadError::UnsupportedType(file_name.to_string()))
    }
}

/// Decodes UTF-8 (dropping a leading BOM) and folds `\r\n` and lone `\r`
/// into `\n`, so uploaded line breaks behave like typed ones.
pub fn decode_text(data: &[u8]) -> Result<String, UploadError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let text = std::str::from_utf8(data).map_err(|_| UploadError::NotUtf8)?;
    Ok(normalize_line_endings(text).into_owned())
}

/// Pulls the raw text out of a `.docx` package: one line per paragraph,
/// `<w:br/>` as a line break. Formatting, tables and images are ignored.
pub fn extract_docx_text(data: &[u8]) -> Result<String, UploadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(invalid_docx)?;
    let mut body = Vec::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(invalid_docx)?
        .take(DOCX_BODY_LIMIT + 1)
        .read_to_end(&mut body)
        .map_err(invalid_docx)?;
    if body.len() as u64 > DOCX_BODY_LIMIT {
        return Err(UploadError::InvalidDocx("document body is too large".to_string()));
    }

    let mut reader = Reader::from_reader(body.as_slice());
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:br" | b"w:cr" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                text.push_str(&e.unescape().map_err(invalid_docx)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(invalid_docx(e)),
            _ => {}
        }
        buf.clear();
    }

    let text = normalize_line_endings(text.trim_end_matches('\n')).into_owned();
    Ok(text)
}

fn invalid_docx(e: impl std::fmt::Display) -> UploadError {
    UploadError::InvalidDocx(e.to_string())
}

/// Builds a minimal `.docx` package with one paragraph per entry.
#[cfg(test)]
pub(crate) fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(DOCX_BODY, zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
