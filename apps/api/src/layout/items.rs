//! Content item derivation: turns the poster content model into the ordered
//! list of placeable tiles consumed by the column planner.
//!
//! Items carry no identity between requests; they are rebuilt on every render.

use serde::Serialize;

use crate::layout::theme::{section_colors, TileColors};
use crate::models::poster::PosterData;

/// Display order of the key-takeaways tile. Always after every section and image.
pub const KEY_TAKEAWAYS_ORDER: u32 = 98;
/// Display order of the references tile. Always last.
pub const REFERENCES_ORDER: u32 = 99;

pub const DEFAULT_REFERENCES_TITLE: &str = "References";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    pub caption: String,
    pub upper_caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoint {
    pub text: String,
    pub description: String,
    /// Source index of the point, used for the number-circle palette.
    pub color_index: usize,
}

/// One placeable unit of poster content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentItem {
    #[serde(rename_all = "camelCase")]
    Section {
        display_order: u32,
        title: String,
        body: String,
        header_color: TileColors,
        body_color: TileColors,
        content_length: usize,
    },
    #[serde(rename_all = "camelCase")]
    ImageBlock {
        display_order: u32,
        images: Vec<ImageRef>,
    },
    #[serde(rename_all = "camelCase")]
    KeyTakeaways { points: Vec<KeyPoint> },
    #[serde(rename_all = "camelCase")]
    References { title: String, lines: Vec<String> },
}

impl ContentItem {
    pub fn display_order(&self) -> u32 {
        match self {
            ContentItem::Section { display_order, .. } => *display_order,
            ContentItem::ImageBlock { display_order, .. } => *display_order,
            ContentItem::KeyTakeaways { .. } => KEY_TAKEAWAYS_ORDER,
            ContentItem::References { .. } => REFERENCES_ORDER,
        }
    }

    /// Pinned items always go to the last column.
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            ContentItem::KeyTakeaways { .. } | ContentItem::References { .. }
        )
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ContentItem::Section { .. } => ItemKind::Section,
            ContentItem::ImageBlock { .. } => ItemKind::ImageBlock,
            ContentItem::KeyTakeaways { .. } => ItemKind::KeyTakeaways,
            ContentItem::References { .. } => ItemKind::References,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Section,
    ImageBlock,
    KeyTakeaways,
    References,
}

/// Density statistics fed to the column count selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub total_items: usize,
    /// Total section characters divided by `total_items`.
    pub average_content_length: f32,
}

impl ContentStats {
    pub fn from_items(items: &[ContentItem]) -> Self {
        let total_items = items.len();
        let total_length: usize = items
            .iter()
            .map(|item| match item {
                ContentItem::Section { content_length, .. } => *content_length,
                _ => 0,
            })
            .sum();
        let average_content_length = if total_items > 0 {
            total_length as f32 / total_items as f32
        } else {
            0.0
        };
        Self {
            total_items,
            average_content_length,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Derivation
// ────────────────────────────────────────────────────────────────────────────

/// Builds the content items for a poster, sorted by display order.
pub fn build_content_items(poster: &PosterData) -> Vec<ContentItem> {
    let mut items = Vec::new();
    let section_count = poster.sections.len() as u32;

    for (index, section) in poster.sections.iter().enumerate() {
        if section.content.trim().is_empty() {
            continue;
        }
        let (header_color, body_color) = section_colors(index);
        items.push(ContentItem::Section {
            display_order: index as u32 + 1,
            title: section.title.clone(),
            body: section.content.clone(),
            header_color,
            body_color,
            content_length: section.content.chars().count(),
        });
    }

    let images: Vec<ImageRef> = poster
        .images
        .iter()
        .filter(|img| img.shown() && !img.url.trim().is_empty())
        .map(|img| ImageRef {
            url: img.url.clone(),
            caption: img.caption.clone(),
            upper_caption: img.upper_caption.clone().filter(|c| !c.trim().is_empty()),
        })
        .collect();
    if !images.is_empty() {
        items.push(ContentItem::ImageBlock {
            display_order: section_count + 1,
            images,
        });
    }

    if poster.keypoints_shown() {
        let points = visible_key_points(poster);
        if !points.is_empty() {
            items.push(ContentItem::KeyTakeaways { points });
        }
    }

    if poster.references_shown() {
        let lines = reference_lines(&poster.references);
        if !lines.is_empty() {
            let title = poster
                .references_title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REFERENCES_TITLE.to_string());
            items.push(ContentItem::References { title, lines });
        }
    }

    items.sort_by_key(ContentItem::display_order);
    items
}

/// Key points with non-blank text whose visibility flag is not `false`.
pub fn visible_key_points(poster: &PosterData) -> Vec<KeyPoint> {
    poster
        .keypoints
        .iter()
        .enumerate()
        .filter(|(index, point)| !point.trim().is_empty() && poster.key_point_visible(*index))
        .map(|(index, point)| KeyPoint {
            text: point.clone(),
            description: poster
                .key_descriptions
                .get(index)
                .cloned()
                .unwrap_or_default(),
            color_index: index,
        })
        .collect()
}

/// Non-blank lines of a newline-delimited reference list, trimmed.
pub fn reference_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::poster::{PosterImage, PosterSection};

    fn section(title: &str, content: &str) -> PosterSection {
        PosterSection {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn make_poster() -> PosterData {
        PosterData {
            title: "Poster".to_string(),
            sections: vec![
                section("Introduction", "Intro text"),
                section("Methods", "   "),
                section("Findings", "Findings text"),
            ],
            keypoints: vec!["First".to_string(), "".to_string(), "Third".to_string()],
            key_descriptions: vec!["one".to_string()],
            images: vec![
                PosterImage {
                    url: "https://example.org/a.png".to_string(),
                    caption: "A".to_string(),
                    upper_caption: None,
                    visible: None,
                },
                PosterImage {
                    url: "https://example.org/b.png".to_string(),
                    caption: "B".to_string(),
                    upper_caption: None,
                    visible: Some(false),
                },
            ],
            references: "Ref one\n\n  Ref two  \n".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_blank_sections_are_skipped_but_keep_numbering() {
        let items = build_content_items(&make_poster());
        let orders: Vec<u32> = items.iter().map(ContentItem::display_order).collect();
        // Sections 1 and 3, images at N+1 = 4, then pinned 98 and 99.
        assert_eq!(orders, vec![1, 3, 4, 98, 99]);
    }

    #[test]
    fn test_hidden_images_are_excluded() {
        let items = build_content_items(&make_poster());
        match &items[2] {
            ContentItem::ImageBlock { images, .. } => {
                assert_eq!(images.len(), 1);
                assert_eq!(images[0].caption, "A");
            }
            other => panic!("expected image block, got {other:?}"),
        }
    }

    #[test]
    fn test_key_points_keep_source_index_for_colors() {
        let points = visible_key_points(&make_poster());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].description, "one");
        assert_eq!(points[1].text, "Third");
        assert_eq!(points[1].color_index, 2);
        assert_eq!(points[1].description, "");
    }

    #[test]
    fn test_key_visibility_false_hides_point() {
        let mut poster = make_poster();
        poster.key_visibility = vec![Some(false)];
        let points = visible_key_points(&poster);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].text, "Third");
    }

    #[test]
    fn test_show_flags_remove_pinned_items() {
        let mut poster = make_poster();
        poster.show_keypoints = Some(false);
        poster.show_references = Some(false);
        let items = build_content_items(&poster);
        assert!(items.iter().all(|item| !item.is_pinned()));
    }

    #[test]
    fn test_reference_lines_trimmed_and_nonblank() {
        assert_eq!(
            reference_lines("Ref one\n\n  Ref two  \n"),
            vec!["Ref one".to_string(), "Ref two".to_string()]
        );
        assert!(reference_lines(" \n \n").is_empty());
    }

    #[test]
    fn test_references_title_defaults() {
        let items = build_content_items(&make_poster());
        match items.last() {
            Some(ContentItem::References { title, lines }) => {
                assert_eq!(title, DEFAULT_REFERENCES_TITLE);
                assert_eq!(lines.len(), 2);
            }
            other => panic!("expected references last, got {other:?}"),
        }
    }

    #[test]
    fn test_stats_divide_section_length_by_all_items() {
        let items = build_content_items(&make_poster());
        let stats = ContentStats::from_items(&items);
        assert_eq!(stats.total_items, 5);
        let expected = ("Intro text".len() + "Findings text".len()) as f32 / 5.0;
        assert!((stats.average_content_length - expected).abs() < 1e-4);
    }

    #[test]
    fn test_stats_empty() {
        let stats = ContentStats::from_items(&[]);
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.average_content_length, 0.0);
    }
}
