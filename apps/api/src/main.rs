mod config;
mod errors;
mod layout;
mod render;
mod routes;
mod sheets;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::default_grid_size;
use crate::render::{EmbeddedFont, FontSource};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gridsheet API v{}", env!("CARGO_PKG_VERSION"));

    let page = config.default_page_size.config();
    info!(
        "Default page: {} ({}x{} cells, {}mm grid)",
        config.default_page_size,
        page.columns,
        page.rows,
        default_grid_size(page).side_mm()
    );

    // Load the export font once; every PDF request shares it
    let fonts = match &config.font_path {
        Some(path) => {
            let font = EmbeddedFont::from_file(path)
                .with_context(|| format!("Failed to load FONT_PATH {}", path.display()))?;
            FontSource::Embedded(Arc::new(font))
        }
        None => {
            warn!("FONT_PATH not set; PDF export uses Helvetica and leaves CJK cells blank");
            FontSource::Builtin
        }
    };
    info!("PDF font: {}", fonts.describe());

    let state = AppState {
        config: config.clone(),
        fonts,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
