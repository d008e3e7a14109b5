//! Font readiness before PDF composition.
//!
//! The PDF uses the standard Type 1 families, so the built-in preloader is
//! ready immediately. The seam stays async so a preloader for embedded font
//! programs can be swapped in through `AppState`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::font_metrics::{get_metrics, FontFamily};

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font {0} has no metrics")]
    MissingMetrics(String),

    #[error("Font loading failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait FontPreloader: Send + Sync {
    /// Resolves once every font the composer may use is available.
    async fn ready(&self) -> Result<(), FontLoadError>;
}

pub struct BuiltinFontPreloader;

#[async_trait]
impl FontPreloader for BuiltinFontPreloader {
    async fn ready(&self) -> Result<(), FontLoadError> {
        for family in FontFamily::ALL {
            let metrics = get_metrics(family);
            if metrics.space_width <= 0.0 {
                return Err(FontLoadError::MissingMetrics(format!("{family:?}")));
            }
        }
        Ok(())
    }
}

/// Waits for fonts at most `timeout`. Returns whether they reported ready;
/// on failure or timeout composition continues with fallback fonts.
pub async fn await_fonts(preloader: &dyn FontPreloader, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, preloader.ready()).await {
        Ok(Ok(())) => {
            debug!("Fonts ready");
            true
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Font preload failed, continuing with fallback fonts");
            false
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Font preload timed out, continuing with fallback fonts"
            );
            false
        }
    }
}
