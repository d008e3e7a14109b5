//! Screen preview model: the masonry columns, header and scale state the
//! browser renders at A0 point size inside a CSS `scale()` transform.

use serde::{Deserialize, Serialize};

use crate::layout::items::{visible_key_points, ContentItem, ItemKind};
use crate::layout::scaling::{
    fit_zoom_level, ContainerSize, DeviceClass, ScaleState, SurfaceSize, ViewportFitScaler,
};
use crate::layout::{plan_poster, ContentStats, POSTER_THEME};
use crate::models::poster::{DesignSettings, PosterData};
use crate::render::qr::poster_qr_url;

/// Sections longer than this get the large tile treatment.
pub const LARGE_SECTION_CHARS: usize = 400;
/// References expand when at most this many key points are visible.
pub const EXPANDED_REFERENCES_MAX_KEY_POINTS: usize = 2;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeHint {
    Small,
    Normal,
    Large,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTile {
    pub kind: ItemKind,
    pub display_order: u32,
    pub size_hint: SizeHint,
    pub item: ContentItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleField {
    pub field: &'static str,
    pub text: String,
    pub flex_basis_percent: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewHeader {
    pub title: String,
    pub subtitle: Vec<SubtitleField>,
    pub qr_image_url: Option<String>,
    pub qr_caption: Option<String>,
    pub background_color: String,
    pub text_color: String,
    pub title_font: String,
    pub content_font: String,
}

/// Viewport measurements posted by the hosting view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    /// Defaults to the A0 surface drawn at native size.
    #[serde(default)]
    pub surface: Option<SurfaceSize>,
    pub container: ContainerSize,
    #[serde(default)]
    pub compact: bool,
    /// Current (or caller-pinned) zoom level.
    #[serde(default)]
    pub zoom: Option<f64>,
    /// True once the view has applied its first fit; suppresses the snap.
    #[serde(default)]
    pub initialized: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportFrame {
    pub state: ScaleState,
    pub css_transform: String,
    pub is_fit_to_window: bool,
    pub initialized: bool,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewFrame {
    /// Pass back as `columnCount` on export so the PDF matches this preview.
    pub column_count: usize,
    pub stats: ContentStats,
    pub columns: Vec<Vec<PreviewTile>>,
    pub header: PreviewHeader,
    pub viewport: Option<ViewportFrame>,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Builds the preview frame. Returns `None` only for an invalid surface in
/// the viewport request.
pub fn build_preview(
    poster: &PosterData,
    design: &DesignSettings,
    qr_service_url: &str,
    viewport: Option<&ViewportRequest>,
) -> Option<PreviewFrame> {
    let viewport = match viewport {
        Some(request) => Some(fit_viewport(request)?),
        None => None,
    };

    let layout = plan_poster(poster, design, None);
    let expand = references_expand(poster);
    let columns = layout
        .plan
        .columns
        .into_iter()
        .map(|column| {
            column
                .into_iter()
                .map(|item| PreviewTile {
                    kind: item.kind(),
                    display_order: item.display_order(),
                    size_hint: size_hint(&item, expand),
                    item,
                })
                .collect()
        })
        .collect();

    Some(PreviewFrame {
        column_count: layout.column_count,
        stats: layout.stats,
        columns,
        header: build_header(poster, design, qr_service_url),
        viewport,
    })
}

/// References take the freed space when key takeaways are hidden or short.
pub fn references_expand(poster: &PosterData) -> bool {
    !poster.keypoints_shown()
        || visible_key_points(poster).len() <= EXPANDED_REFERENCES_MAX_KEY_POINTS
}

pub fn size_hint(item: &ContentItem, references_expand: bool) -> SizeHint {
    match item {
        ContentItem::Section { content_length, .. } if *content_length > LARGE_SECTION_CHARS => {
            SizeHint::Large
        }
        ContentItem::References { .. } if references_expand => SizeHint::Large,
        ContentItem::KeyTakeaways { .. } if references_expand => SizeHint::Small,
        _ => SizeHint::Normal,
    }
}

/// Non-empty subtitle fields, sharing the row equally.
pub fn subtitle_fields(poster: &PosterData) -> Vec<SubtitleField> {
    let fields: Vec<(&'static str, &str)> = [
        ("authors", poster.authors.as_str()),
        ("school", poster.school.as_str()),
        ("contact", poster.contact.as_str()),
    ]
    .into_iter()
    .map(|(field, text)| (field, text.trim()))
    .filter(|(_, text)| !text.is_empty())
    .collect();

    let basis = if fields.is_empty() {
        0.0
    } else {
        100.0 / fields.len() as f32
    };
    fields
        .into_iter()
        .map(|(field, text)| SubtitleField {
            field,
            text: text.to_string(),
            flex_basis_percent: basis,
        })
        .collect()
}

fn build_header(poster: &PosterData, design: &DesignSettings, qr_service_url: &str) -> PreviewHeader {
    let qr_image_url = poster_qr_url(qr_service_url, poster);
    let qr_caption = qr_image_url.as_ref().and_then(|_| {
        poster
            .qr_code_caption
            .clone()
            .filter(|c| !c.trim().is_empty())
    });
    PreviewHeader {
        title: poster.title.clone(),
        subtitle: subtitle_fields(poster),
        qr_image_url,
        qr_caption,
        background_color: design.header_bg_color.clone(),
        text_color: design.header_text_color.clone(),
        title_font: design.title_font.clone(),
        content_font: design.content_font.clone(),
    }
}

/// Runs one measurement through a scaler restored from the request.
pub fn fit_viewport(request: &ViewportRequest) -> Option<ViewportFrame> {
    let surface = request
        .surface
        .unwrap_or_else(|| SurfaceSize::for_theme(&POSTER_THEME));
    if !surface.is_valid() {
        return None;
    }
    let device = DeviceClass::from_compact(request.compact);
    let mut scaler = match (request.initialized, request.zoom) {
        (true, Some(zoom)) => ViewportFitScaler::restore(surface, device, zoom),
        // Latched without a zoom: resume at fit, never re-run the first snap.
        (true, None) => {
            let zoom = fit_zoom_level(&surface, &request.container, device).unwrap_or(1.0);
            ViewportFitScaler::restore(surface, device, zoom)
        }
        (false, pinned) => ViewportFitScaler::new(surface, device, pinned),
    };
    scaler.on_container_resize(&request.container);
    let (scroll_left, scroll_top) = scaler.scroll_offset(&request.container);

    Some(ViewportFrame {
        state: scaler.state(),
        css_transform: scaler.css_transform(),
        is_fit_to_window: scaler.is_fit_to_window(),
        initialized: scaler.is_initialized(),
        scroll_left,
        scroll_top,
    })
}
