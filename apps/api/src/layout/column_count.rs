//! Column count selection: density heuristic plus a width-based refinement.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::items::ContentStats;
use crate::layout::theme::{PosterTheme, MAX_LEGIBLE_COLUMN_WIDTH_PT};

/// Horizontal space the grid may use, and the widest column still legible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthBudget {
    pub available_width: f32,
    pub gap: f32,
    pub max_column_width: f32,
}

impl WidthBudget {
    pub fn for_theme(theme: &PosterTheme) -> Self {
        Self {
            available_width: theme.content_width(),
            gap: theme.spacing.tile_gap,
            max_column_width: MAX_LEGIBLE_COLUMN_WIDTH_PT,
        }
    }

    /// Width of one column when the grid is split into `columns`.
    pub fn column_width(&self, columns: usize) -> f32 {
        let columns = columns.max(1) as f32;
        (self.available_width - self.gap * (columns - 1.0)) / columns
    }
}

/// Picks a column count in `[2, max_columns]` for the given content density.
///
/// Fewer than two items collapse to `max(total_items, 1)` columns so callers
/// always get a usable last column.
pub fn select_column_count(
    total_items: usize,
    average_content_length: f32,
    max_columns: usize,
    budget: &WidthBudget,
) -> usize {
    let max_columns = max_columns.max(2);

    let mut columns = if total_items <= 6 && average_content_length < 800.0 {
        2
    } else if total_items <= 9 && average_content_length < 1200.0 {
        3.min(max_columns)
    } else {
        max_columns
    };

    while budget.column_width(columns) > budget.max_column_width && columns < max_columns {
        columns += 1;
    }

    let resolved = if total_items < 2 {
        total_items.max(1)
    } else {
        columns.min(total_items).min(max_columns).max(2)
    };

    debug!(
        total_items,
        average_content_length, max_columns, resolved, "Selected column count"
    );
    resolved
}

/// Convenience wrapper over [`select_column_count`] for derived stats.
pub fn select_for_stats(stats: &ContentStats, max_columns: usize, budget: &WidthBudget) -> usize {
    select_column_count(
        stats.total_items,
        stats.average_content_length,
        max_columns,
        budget,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::theme::POSTER_THEME;

    fn a0_budget() -> WidthBudget {
        WidthBudget::for_theme(&POSTER_THEME)
    }

    #[test]
    fn test_small_sparse_poster_gets_two_columns() {
        assert_eq!(select_column_count(5, 500.0, 3, &a0_budget()), 2);
    }

    #[test]
    fn test_medium_poster_gets_three_columns() {
        assert_eq!(select_column_count(8, 1000.0, 3, &a0_budget()), 3);
    }

    #[test]
    fn test_dense_landscape_poster_gets_max_columns() {
        assert_eq!(select_column_count(10, 1500.0, 4, &a0_budget()), 4);
    }

    #[test]
    fn test_medium_density_capped_by_max_columns() {
        // Heuristic wants 3; still 3 on landscape since min(3, 4) = 3.
        assert_eq!(select_column_count(9, 1100.0, 4, &a0_budget()), 3);
    }

    #[test]
    fn test_six_items_but_dense_gets_three() {
        assert_eq!(select_column_count(6, 900.0, 3, &a0_budget()), 3);
    }

    #[test]
    fn test_never_more_columns_than_items() {
        assert_eq!(select_column_count(3, 5000.0, 4, &a0_budget()), 3);
        assert_eq!(select_column_count(2, 5000.0, 4, &a0_budget()), 2);
    }

    #[test]
    fn test_degenerate_item_counts() {
        assert_eq!(select_column_count(1, 100.0, 3, &a0_budget()), 1);
        assert_eq!(select_column_count(0, 0.0, 3, &a0_budget()), 1);
    }

    #[test]
    fn test_a0_two_columns_already_legible() {
        // (2272 - 36) / 2 = 1118 <= 1192, so refinement never fires on A0 portrait.
        let budget = a0_budget();
        assert!((budget.column_width(2) - 1118.0).abs() < 1e-3);
        assert_eq!(select_column_count(4, 100.0, 4, &budget), 2);
    }

    #[test]
    fn test_wide_budget_refines_upwards() {
        let budget = WidthBudget {
            available_width: 3258.0,
            gap: 36.0,
            max_column_width: 1192.0,
        };
        // Two columns would be 1611pt wide; three are 1062pt.
        assert_eq!(select_column_count(5, 100.0, 4, &budget), 3);
    }

    #[test]
    fn test_refinement_stops_at_max_columns() {
        let budget = WidthBudget {
            available_width: 10_000.0,
            gap: 36.0,
            max_column_width: 1192.0,
        };
        assert_eq!(select_column_count(12, 100.0, 3, &budget), 3);
    }

    #[test]
    fn test_select_for_stats_matches_raw_call() {
        let stats = ContentStats {
            total_items: 7,
            average_content_length: 214.0,
        };
        assert_eq!(select_for_stats(&stats, 3, &a0_budget()), 3);
    }
}
