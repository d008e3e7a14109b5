//! Axum route handlers for layout, preview, viewport fit and export.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::layout::{plan_poster, ResolvedLayout};
use crate::models::poster::{DesignSettings, PosterData};
use crate::render::export::{export_pdf, ExportRequest};
use crate::render::preview::{build_preview, fit_viewport, PreviewFrame, ViewportFrame, ViewportRequest};
use crate::state::AppState;

/// Largest column count a caller may force (landscape ceiling).
const MAX_COLUMN_OVERRIDE: usize = 4;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub poster: PosterData,
    #[serde(default)]
    pub design: DesignSettings,
    pub column_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub poster: PosterData,
    #[serde(default)]
    pub design: DesignSettings,
    pub viewport: Option<ViewportRequest>,
}

fn validate_column_count(column_count: Option<usize>) -> Result<(), AppError> {
    match column_count {
        Some(got) if !(1..=MAX_COLUMN_OVERRIDE).contains(&got) => {
            Err(AppError::ColumnCountOutOfRange {
                got,
                max: MAX_COLUMN_OVERRIDE,
            })
        }
        _ => Ok(()),
    }
}

/// `attachment` disposition with an ASCII fallback name and the UTF-8 name
/// percent-encoded alongside.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/posters/layout
///
/// Returns the column count, density statistics and tile placement.
pub async fn handle_layout(
    Json(request): Json<LayoutRequest>,
) -> Result<Json<ResolvedLayout>, AppError> {
    validate_column_count(request.column_count)?;
    Ok(Json(plan_poster(
        &request.poster,
        &request.design,
        request.column_count,
    )))
}

/// POST /api/v1/posters/preview
///
/// Builds the screen preview frame. Pass its `columnCount` back on export.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewFrame>, AppError> {
    build_preview(
        &request.poster,
        &request.design,
        &state.config.qr_service_url,
        request.viewport.as_ref(),
    )
    .map(Json)
    .ok_or(AppError::InvalidSurface)
}

/// POST /api/v1/viewport/fit
pub async fn handle_viewport_fit(
    Json(request): Json<ViewportRequest>,
) -> Result<Json<ViewportFrame>, AppError> {
    fit_viewport(&request).map(Json).ok_or(AppError::InvalidSurface)
}

/// POST /api/v1/posters/export
///
/// Streams the composed A0 PDF back as an attachment.
pub async fn handle_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    validate_column_count(request.column_count)?;
    let exported = export_pdf(&state, request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&exported.filename),
            ),
        ],
        exported.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_count_bounds() {
        assert!(validate_column_count(None).is_ok());
        assert!(validate_column_count(Some(1)).is_ok());
        assert!(validate_column_count(Some(4)).is_ok());
        assert!(validate_column_count(Some(0)).is_err());
        assert!(validate_column_count(Some(5)).is_err());
    }

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("Coral_Reef.pdf"),
            "attachment; filename=\"Coral_Reef.pdf\"; filename*=UTF-8''Coral_Reef.pdf"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("Récif\"s.pdf");
        assert!(value.starts_with("attachment; filename=\"R_cif_s.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''R%C3%A9cif%22s.pdf"));
    }
}
