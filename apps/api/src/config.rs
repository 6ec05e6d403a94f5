use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::layout::{PageSize, PaginationOptions};

/// Application configuration loaded from environment variables.
/// Every variable has a default; startup fails only on malformed values.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Paper size used when a request does not name one.
    pub default_page_size: PageSize,
    pub max_upload_bytes: usize,
    /// Font embedded into exported PDFs. Without it, PDFs use builtin Helvetica.
    pub font_path: Option<PathBuf>,
    /// Pagination defaults; requests may override either field.
    pub pagination: PaginationOptions,
    pub export_filename: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let export_filename = lookup("EXPORT_FILENAME").unwrap_or_else(|| "calligraphy.pdf".to_string());
        validate_filename(&export_filename)?;

        Ok(Config {
            port: parse_var(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            default_page_size: parse_var(&lookup, "DEFAULT_PAGE_SIZE", PageSize::A4)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", 1024 * 1024)?,
            font_path: lookup("FONT_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            pagination: PaginationOptions {
                empty_pages: parse_var(&lookup, "EMPTY_PAGES", Default::default())?,
                padding: parse_var(&lookup, "LAST_PAGE_PADDING", Default::default())?,
            },
            export_filename,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
    }
}

/// The export name goes into a Content-Disposition header verbatim, so it
/// must be printable ASCII without quotes or path separators.
fn validate_filename(name: &str) -> Result<()> {
    if !name.ends_with(".pdf") || name.len() <= 4 {
        bail!("EXPORT_FILENAME must end with .pdf, got '{name}'");
    }
    let allowed = |c: char| (c.is_ascii_graphic() || c == ' ') && !matches!(c, '"' | '/' | '\\');
    if !name.chars().all(allowed) {
        bail!("EXPORT_FILENAME must be printable ASCII without quotes or slashes: '{name}'");
    }
    Ok(())
}
