mod config;
mod errors;
mod layout;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::fonts::BuiltinFontPreloader;
use crate::render::images::{DisabledImageSource, HttpImageSource, ImageSource};
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

    info!("Starting Poster API v{}", env!("CARGO_PKG_VERSION"));

    // Remote images (QR codes, figures) for the PDF export
    let images: Arc<dyn ImageSource> = if config.fetch_remote_images {
        Arc::new(HttpImageSource::new(
            config.image_fetch_timeout,
            config.max_image_bytes,
        )?)
    } else {
        info!("Remote image fetching disabled; PDFs will draw placeholders");
        Arc::new(DisabledImageSource)
    };
    info!(
        "Export config: font timeout {:?}, image timeout {:?}, archive dir {:?}",
        config.font_preload_timeout, config.image_fetch_timeout, config.export_dir
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        fonts: Arc::new(BuiltinFontPreloader),
        images,
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
