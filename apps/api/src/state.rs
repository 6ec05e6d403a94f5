use crate::config::Config;
use crate::render::FontSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Font used by PDF export. Loaded once at startup from `FONT_PATH`.
    pub fonts: FontSource,
}
