//! PDF export boundary.
//!
//! One export attempt: wait for fonts (bounded), resolve the layout with the
//! column count the preview showed, fetch the QR code and figures (each
//! degrading to a placeholder), compose on the blocking pool and optionally
//! archive the file. Any failure surfaces as a single [`ExportError`]; no
//! partial file is left behind.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::layout::items::ContentItem;
use crate::layout::{plan_poster, POSTER_THEME};
use crate::models::poster::{DesignSettings, PosterData};
use crate::render::fonts::await_fonts;
use crate::render::images::fetch_or_placeholder;
use crate::render::pdf::{compose_poster_pdf, PdfAssets};
use crate::render::qr::poster_qr_url;
use crate::state::AppState;

const FALLBACK_FILENAME: &str = "poster.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF composition task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("PDF composition produced no output")]
    Empty,

    #[error("Failed to archive export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist archived export: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub poster: PosterData,
    #[serde(default)]
    pub design: DesignSettings,
    /// Column count the preview used. Absent: the selector runs again.
    pub column_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub export_id: Uuid,
    pub filename: String,
    pub column_count: usize,
    pub bytes: Bytes,
    /// Where the archived copy landed, if archiving is configured.
    pub archived_to: Option<PathBuf>,
}

/// Title with every whitespace run (leading and trailing included) replaced
/// by `_`, plus `.pdf`. An empty title falls back to `poster.pdf`.
pub fn export_filename(title: &str) -> String {
    if title.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }
    let mut stem = String::with_capacity(title.len());
    let mut in_run = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_run {
                stem.push('_');
            }
            in_run = true;
        } else {
            stem.push(c);
            in_run = false;
        }
    }
    format!("{stem}.pdf")
}

pub async fn export_pdf(state: &AppState, request: ExportRequest) -> Result<ExportedPdf, ExportError> {
    let export_id = Uuid::new_v4();
    let ExportRequest {
        poster,
        design,
        column_count,
    } = request;
    let filename = export_filename(&poster.title);
    info!(%export_id, %filename, ?column_count, "Starting PDF export");

    await_fonts(state.fonts.as_ref(), state.config.font_preload_timeout).await;

    let resolved = plan_poster(&poster, &design, column_count);
    let assets = fetch_assets(state, &poster, &resolved.plan.columns).await;

    let created = Utc::now();
    let plan = resolved.plan;
    let bytes = tokio::task::spawn_blocking(move || {
        compose_poster_pdf(&poster, &design, &plan, &assets, &POSTER_THEME, created)
    })
    .await?;

    if bytes.is_empty() {
        return Err(ExportError::Empty);
    }

    let archived_to = match state.config.export_dir.clone() {
        Some(dir) => {
            let name = format!("{export_id}-{filename}");
            let payload = bytes.clone();
            let path = tokio::task::spawn_blocking(move || archive_pdf(&dir, &name, &payload))
                .await??;
            Some(path)
        }
        None => None,
    };

    info!(
        %export_id,
        column_count = resolved.column_count,
        size_bytes = bytes.len(),
        "PDF export complete"
    );

    Ok(ExportedPdf {
        export_id,
        filename,
        column_count: resolved.column_count,
        bytes: Bytes::from(bytes),
        archived_to,
    })
}

/// Where a fetched raster lands in [`PdfAssets`].
enum AssetSlot {
    Qr,
    Figure(String),
}

/// Figure URLs in placement order, each once.
fn figure_urls(columns: &[Vec<ContentItem>]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .flatten()
        .filter_map(|item| match item {
            ContentItem::ImageBlock { images, .. } => Some(images),
            _ => None,
        })
        .flatten()
        .filter(|image| seen.insert(image.url.as_str()))
        .map(|image| image.url.clone())
        .collect()
}

/// Fetches the QR code and every figure the plan places, all at once.
/// Failures have already been logged by `fetch_or_placeholder` and leave
/// the slot empty.
async fn fetch_assets(state: &AppState, poster: &PosterData, columns: &[Vec<ContentItem>]) -> PdfAssets {
    let qr_url = poster_qr_url(&state.config.qr_service_url, poster);

    let mut fetches = JoinSet::new();
    let slots = qr_url
        .iter()
        .map(|url| (AssetSlot::Qr, url.clone()))
        .chain(
            figure_urls(columns)
                .into_iter()
                .map(|url| (AssetSlot::Figure(url.clone()), url)),
        );
    for (slot, url) in slots {
        let source = Arc::clone(&state.images);
        fetches.spawn(async move {
            let raster = fetch_or_placeholder(source.as_ref(), &url).await;
            (slot, raster)
        });
    }

    let mut qr = None;
    let mut images = HashMap::new();
    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok((AssetSlot::Qr, raster)) => qr = raster,
            Ok((AssetSlot::Figure(url), Some(raster))) => {
                images.insert(url, raster);
            }
            Ok((AssetSlot::Figure(_), None)) => {}
            Err(e) => warn!(error = %e, "Image fetch task failed, drawing placeholder"),
        }
    }

    if qr_url.is_some() && qr.is_none() {
        warn!("QR code unavailable, drawing placeholder");
    }

    PdfAssets {
        qr_requested: qr_url.is_some(),
        qr,
        images,
    }
}

/// Writes through a temporary file in `dir` and renames it into place, so
/// the archive never holds a partial PDF.
fn archive_pdf(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    let target = dir.join(name);
    file.persist(&target)?;
    Ok(target)
}
