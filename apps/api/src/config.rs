use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::render::qr::DEFAULT_QR_SERVICE_URL;

const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Service configuration loaded from environment variables.
/// Every key has a default; a malformed value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the QR image endpoint (query string appended per poster).
    pub qr_service_url: String,
    pub font_preload_timeout: Duration,
    pub image_fetch_timeout: Duration,
    /// Largest figure or QR body accepted from a remote URL, in bytes.
    pub max_image_bytes: usize,
    /// When false, QR codes and poster images render as placeholders in the PDF.
    pub fetch_remote_images: bool,
    /// If set, every successful export is also archived here.
    pub export_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            qr_service_url: std::env::var("QR_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_QR_SERVICE_URL.to_string()),
            font_preload_timeout: Duration::from_millis(
                parse_env("FONT_PRELOAD_TIMEOUT_MS", 5000u64)
                    .context("FONT_PRELOAD_TIMEOUT_MS must be an integer")?,
            ),
            image_fetch_timeout: Duration::from_secs(
                parse_env("IMAGE_FETCH_TIMEOUT_SECS", 10u64)
                    .context("IMAGE_FETCH_TIMEOUT_SECS must be an integer")?,
            ),
            max_image_bytes: parse_env("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)
                .context("MAX_IMAGE_BYTES must be an integer")?,
            fetch_remote_images: parse_env("FETCH_REMOTE_IMAGES", true)
                .context("FETCH_REMOTE_IMAGES must be true or false")?,
            export_dir: std::env::var("EXPORT_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            qr_service_url: DEFAULT_QR_SERVICE_URL.to_string(),
            font_preload_timeout: Duration::from_millis(5000),
            image_fetch_timeout: Duration::from_secs(10),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            fetch_remote_images: true,
            export_dir: None,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for environment variable '{key}'")),
        Err(_) => Ok(default),
    }
}
