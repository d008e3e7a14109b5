use std::sync::Arc;

use crate::config::Config;
use crate::render::fonts::FontPreloader;
use crate::render::images::ImageSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Awaited (bounded by `config.font_preload_timeout`) before each PDF export.
    pub fonts: Arc<dyn FontPreloader>,
    /// QR code and figure fetcher. `DisabledImageSource` when remote fetches are off.
    pub images: Arc<dyn ImageSource>,
}
