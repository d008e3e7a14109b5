//! Remote raster fetching for QR codes and poster figures.
//!
//! `AppState` holds an `Arc<dyn ImageSource>`. A failed fetch never fails an
//! export: callers go through [`fetch_or_placeholder`] and draw an empty
//! frame in place of the image.
//!
//! Bodies are capped at `Config::max_image_bytes` while they stream in, and
//! decoding runs under explicit [`image::Limits`].

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageError, ImageReader, Limits};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

/// Widest or tallest figure accepted by the decoder, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 8192;
/// Decoder allocation ceiling in bytes.
pub const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image request for {url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("Image at {url} exceeds the {limit}-byte limit")]
    TooLarge { url: String, limit: usize },

    #[error("Image decode error: {0}")]
    Decode(#[from] ImageError),

    #[error("Remote image fetching is disabled")]
    Disabled,
}

/// Decoded 8-bit RGB pixels, row-major, with an optional 8-bit alpha plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    /// One byte per pixel; `None` for opaque sources.
    pub alpha: Option<Vec<u8>>,
}

impl RasterImage {
    /// Height over width; 1.0 for a degenerate image.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            1.0
        } else {
            self.height as f32 / self.width as f32
        }
    }
}

/// Decoder limits for fetched figures.
pub fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Decodes PNG or JPEG bytes into RGB. Sources with an alpha channel keep
/// it as a separate plane so the PDF can apply it as a soft mask.
pub fn decode_raster(bytes: &[u8], limits: Limits) -> Result<RasterImage, ImageFetchError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?;
    reader.limits(limits);
    let decoded = reader.decode()?;

    let (width, height) = (decoded.width(), decoded.height());
    if !decoded.color().has_alpha() {
        return Ok(RasterImage {
            width,
            height,
            rgb: decoded.to_rgb8().into_raw(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8().into_raw();
    let pixels = rgba.len() / 4;
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let alpha = if alpha.iter().all(|a| *a == u8::MAX) {
        None
    } else {
        Some(alpha)
    };
    Ok(RasterImage {
        width,
        height,
        rgb,
        alpha,
    })
}

/// Appends `chunk` to `body`, failing once the total passes `limit`.
fn append_capped(
    body: &mut Vec<u8>,
    chunk: &[u8],
    limit: usize,
    url: &str,
) -> Result<(), ImageFetchError> {
    if body.len() + chunk.len() > limit {
        return Err(ImageFetchError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RasterImage, ImageFetchError>;
}

/// Fetches images over HTTP with a per-request timeout and a body size cap.
#[derive(Clone)]
pub struct HttpImageSource {
    client: Client,
    max_bytes: usize,
}

impl HttpImageSource {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, ImageFetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<RasterImage, ImageFetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let too_large = || ImageFetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };
        let declared = response.content_length();
        if declared.is_some_and(|len| len > self.max_bytes as u64) {
            return Err(too_large());
        }

        let mut body = Vec::with_capacity(declared.unwrap_or(0) as usize);
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut body, &chunk, self.max_bytes, url)?;
        }
        debug!(url, bytes = body.len(), "Fetched remote image");
        decode_raster(&body, decode_limits())
    }
}

/// Used when `FETCH_REMOTE_IMAGES=false`: every image renders as a placeholder.
pub struct DisabledImageSource;

#[async_trait]
impl ImageSource for DisabledImageSource {
    async fn fetch(&self, _url: &str) -> Result<RasterImage, ImageFetchError> {
        Err(ImageFetchError::Disabled)
    }
}

/// Fetches `url`, logging and swallowing any failure.
pub async fn fetch_or_placeholder(source: &dyn ImageSource, url: &str) -> Option<RasterImage> {
    match source.fetch(url).await {
        Ok(image) => Some(image),
        Err(ImageFetchError::Disabled) => None,
        Err(e) => {
            warn!(url, error = %e, "Image unavailable, drawing placeholder");
            None
        }
    }
}
