use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::export::ExportError;

/// User-facing message for any failed export. Details go to the log only.
pub const EXPORT_FAILED_MESSAGE: &str = "PDF export failed. Please try again.";

/// Request-level error for the poster handlers.
/// `IntoResponse` renders it as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("columnCount must be between 1 and {max}, got {got}")]
    ColumnCountOutOfRange { got: usize, max: usize },

    #[error("surface width and height must be positive")]
    InvalidSurface,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::ColumnCountOutOfRange { .. } | AppError::InvalidSurface => "VALIDATION_ERROR",
            AppError::Export(_) => "EXPORT_FAILED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ColumnCountOutOfRange { .. } | AppError::InvalidSurface => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Export(e) => {
                tracing::error!(error = %e, "PDF export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    EXPORT_FAILED_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
