// Poster layout core: content items, column count selection, column placement
// and viewport fit scaling. Everything here is synchronous and pure; both the
// preview and the PDF renderer go through `plan_poster`.

pub mod column_count;
pub mod font_metrics;
pub mod items;
pub mod placer;
pub mod scaling;
pub mod theme;

use serde::Serialize;
use tracing::debug;

use crate::models::poster::{DesignSettings, PosterData};

pub use column_count::{select_for_stats, WidthBudget};
pub use items::{build_content_items, ContentItem, ContentStats};
pub use placer::{place_items, LayoutPlan};
pub use theme::POSTER_THEME;

/// Column count, density statistics and placement for one render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLayout {
    pub column_count: usize,
    pub stats: ContentStats,
    pub plan: LayoutPlan,
}

/// Runs selector and placer over already-derived items.
///
/// An explicit `column_count` (the one the preview showed) bypasses the
/// selector so both renderers agree.
pub fn plan_layout(
    items: Vec<ContentItem>,
    max_columns: usize,
    column_count: Option<usize>,
) -> ResolvedLayout {
    let stats = ContentStats::from_items(&items);
    let column_count = match column_count {
        Some(explicit) => explicit,
        None => select_for_stats(&stats, max_columns, &WidthBudget::for_theme(&POSTER_THEME)),
    };
    let plan = place_items(items, column_count);
    debug!(
        column_count = plan.column_count(),
        items = plan.item_count(),
        "Planned poster layout"
    );
    ResolvedLayout {
        column_count: plan.column_count(),
        stats,
        plan,
    }
}

pub fn plan_poster(
    poster: &PosterData,
    design: &DesignSettings,
    column_count: Option<usize>,
) -> ResolvedLayout {
    plan_layout(
        build_content_items(poster),
        design.orientation.max_columns(),
        column_count,
    )
}
