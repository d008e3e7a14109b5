//! Column placement: greedy left-weighted distribution of poster tiles.
//!
//! The preview and the PDF both place tiles through [`place_items`], so the
//! two layouts are structurally identical. The advance threshold
//! (`ceil(remaining / remaining_columns) + 1`) is a frozen contract: changing
//! it changes every existing poster's layout.

use serde::Serialize;

use crate::layout::items::ContentItem;

/// Columns of content items, left to right, each top to bottom.
///
/// Every input item appears exactly once. Pinned items sit at the end of the
/// last column, key takeaways before references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub columns: Vec<Vec<ContentItem>>,
}

impl LayoutPlan {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn item_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn last_column(&self) -> Option<&[ContentItem]> {
        self.columns.last().map(Vec::as_slice)
    }
}

/// Distributes `items` over `column_count` columns.
///
/// Items are first stably sorted by display order. Regular items fill columns
/// left to right; the cursor moves on once the current column reaches one
/// more than the ceiling average of what is left per remaining column. A
/// column count of zero is treated as one.
pub fn place_items(mut items: Vec<ContentItem>, column_count: usize) -> LayoutPlan {
    let column_count = column_count.max(1);
    items.sort_by_key(ContentItem::display_order);

    let (pinned, regular): (Vec<ContentItem>, Vec<ContentItem>) =
        items.into_iter().partition(ContentItem::is_pinned);

    let mut columns: Vec<Vec<ContentItem>> = vec![Vec::new(); column_count];
    let mut cursor = 0usize;
    let regular_len = regular.len();

    for (i, item) in regular.into_iter().enumerate() {
        columns[cursor].push(item);

        let remaining_items = regular_len - i - 1;
        let remaining_columns = column_count - cursor - 1;
        if remaining_columns > 0 && remaining_items >= remaining_columns {
            let avg_per_remaining = remaining_items.div_ceil(remaining_columns);
            if columns[cursor].len() >= avg_per_remaining + 1 {
                cursor += 1;
            }
        }
    }

    // Partition keeps relative order, so key takeaways (98) precede references (99).
    columns[column_count - 1].extend(pinned);

    LayoutPlan { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::items::{ImageRef, KeyPoint};
    use crate::layout::theme::section_colors;

    fn section(order: u32, len: usize) -> ContentItem {
        let (header_color, body_color) = section_colors(order as usize);
        ContentItem::Section {
            display_order: order,
            title: format!("Section {order}"),
            body: "x".repeat(len),
            header_color,
            body_color,
            content_length: len,
        }
    }

    fn images(order: u32) -> ContentItem {
        ContentItem::ImageBlock {
            display_order: order,
            images: vec![ImageRef {
                url: "https://example.org/figure.png".to_string(),
                caption: "Figure".to_string(),
                upper_caption: None,
            }],
        }
    }

    fn key_takeaways(n: usize) -> ContentItem {
        ContentItem::KeyTakeaways {
            points: (0..n)
                .map(|i| KeyPoint {
                    text: format!("Point {i}"),
                    description: String::new(),
                    color_index: i,
                })
                .collect(),
        }
    }

    fn references(n: usize) -> ContentItem {
        ContentItem::References {
            title: "References".to_string(),
            lines: (0..n).map(|i| format!("Ref {i}")).collect(),
        }
    }

    fn orders(column: &[ContentItem]) -> Vec<u32> {
        column.iter().map(ContentItem::display_order).collect()
    }

    fn sorted_orders(plan: &LayoutPlan) -> Vec<u32> {
        let mut all: Vec<u32> = plan.columns.iter().flat_map(|c| orders(c)).collect();
        all.sort_unstable();
        all
    }

    #[test]
    fn test_reference_scenario_three_columns() {
        // 4 sections + images + key takeaways + references on portrait A0.
        let items = vec![
            section(1, 100),
            section(2, 200),
            section(3, 300),
            section(4, 900),
            images(5),
            key_takeaways(3),
            references(5),
        ];
        let plan = place_items(items, 3);
        assert_eq!(plan.column_count(), 3);
        assert_eq!(orders(&plan.columns[0]), vec![1, 2, 3]);
        assert_eq!(orders(&plan.columns[1]), vec![4, 5]);
        assert_eq!(orders(&plan.columns[2]), vec![98, 99]);
    }

    #[test]
    fn test_every_item_placed_once() {
        for column_count in 1..=4 {
            for regular in 0..12u32 {
                let mut items: Vec<ContentItem> =
                    (1..=regular).map(|o| section(o, 10)).collect();
                items.push(key_takeaways(2));
                items.push(references(1));
                let plan = place_items(items, column_count);

                let mut expected: Vec<u32> = (1..=regular).collect();
                expected.push(98);
                expected.push(99);
                assert_eq!(
                    sorted_orders(&plan),
                    expected,
                    "columns={column_count} regular={regular}"
                );
                assert_eq!(plan.column_count(), column_count);
            }
        }
    }

    #[test]
    fn test_pinned_items_end_last_column_in_order() {
        let items = vec![
            references(2),
            section(1, 10),
            key_takeaways(1),
            section(2, 10),
            section(3, 10),
            section(4, 10),
            section(5, 10),
            section(6, 10),
        ];
        let plan = place_items(items, 4);
        let last = plan.last_column().unwrap();
        let tail: Vec<u32> = last.iter().rev().take(2).map(ContentItem::display_order).collect();
        assert_eq!(tail, vec![99, 98]);
        for column in &plan.columns[..3] {
            assert!(column.iter().all(|item| !item.is_pinned()));
        }
    }

    #[test]
    fn test_columns_preserve_display_order() {
        let items = vec![section(3, 10), section(1, 10), images(5), section(2, 10)];
        let plan = place_items(items, 2);
        for column in &plan.columns {
            let o = orders(column);
            let mut sorted = o.clone();
            sorted.sort_unstable();
            assert_eq!(o, sorted);
        }
    }

    #[test]
    fn test_single_column_takes_everything() {
        let items = vec![section(1, 10), section(2, 10), key_takeaways(1)];
        let plan = place_items(items, 1);
        assert_eq!(orders(&plan.columns[0]), vec![1, 2, 98]);
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let plan = place_items(vec![section(1, 10)], 0);
        assert_eq!(plan.column_count(), 1);
        assert_eq!(plan.item_count(), 1);
    }

    #[test]
    fn test_left_weighted_distribution() {
        // 7 regular items over 3 columns leave the last column light.
        let items: Vec<ContentItem> = (1..=7).map(|o| section(o, 10)).collect();
        let plan = place_items(items, 3);
        let lens: Vec<usize> = plan.columns.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![3, 3, 1]);
    }

    #[test]
    fn test_only_pinned_items() {
        let plan = place_items(vec![references(1), key_takeaways(1)], 3);
        assert!(plan.columns[0].is_empty());
        assert!(plan.columns[1].is_empty());
        assert_eq!(orders(&plan.columns[2]), vec![98, 99]);
    }
}
