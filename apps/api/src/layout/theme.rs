//! Fixed A0 poster theme shared by the preview and the PDF renderer.
//!
//! All lengths are PDF points. The preview draws the design surface at the
//! same point size and scales it with a CSS transform.

use serde::Serialize;

/// A0 portrait width in PDF points.
pub const POSTER_A0_WIDTH_PT: f32 = 2384.0;
/// A0 portrait height in PDF points.
pub const POSTER_A0_HEIGHT_PT: f32 = 3370.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FontSizes {
    pub title: f32,
    pub section_header: f32,
    pub body: f32,
    pub key_takeaway: f32,
    pub reference: f32,
    pub subtitle: f32,
    pub qr_caption: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Spacing {
    pub page_padding: f32,
    pub tile_gap: f32,
    pub section_padding: f32,
    pub header_margin: f32,
    pub subtitle_margin: f32,
    pub key_takeaway_margin: f32,
    pub key_circle: f32,
    pub key_circle_text: f32,
    pub reference_margin: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Borders {
    pub tile: f32,
    pub section_header: f32,
    pub subtitle: f32,
    pub key_takeaway: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Radii {
    pub tile: f32,
    pub key_takeaway: f32,
    pub reference: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PosterTheme {
    pub width: f32,
    pub height: f32,
    pub font_sizes: FontSizes,
    pub spacing: Spacing,
    pub border: Borders,
    pub radius: Radii,
}

pub static POSTER_THEME: PosterTheme = PosterTheme {
    width: POSTER_A0_WIDTH_PT,
    height: POSTER_A0_HEIGHT_PT,
    font_sizes: FontSizes {
        title: 64.0,
        section_header: 32.0,
        body: 22.0,
        key_takeaway: 20.0,
        reference: 14.0,
        subtitle: 24.0,
        qr_caption: 14.0,
    },
    spacing: Spacing {
        page_padding: 56.0,
        tile_gap: 36.0,
        section_padding: 28.0,
        header_margin: 16.0,
        subtitle_margin: 36.0,
        key_takeaway_margin: 18.0,
        key_circle: 56.0,
        key_circle_text: 32.0,
        reference_margin: 12.0,
    },
    border: Borders {
        tile: 2.5,
        section_header: 3.0,
        subtitle: 2.0,
        key_takeaway: 2.0,
    },
    radius: Radii {
        tile: 16.0,
        key_takeaway: 14.0,
        reference: 14.0,
    },
};

/// Columns wider than this are hard to read on a printed poster.
pub const MAX_LEGIBLE_COLUMN_WIDTH_PT: f32 = 1192.0;

impl PosterTheme {
    /// Inner page width: the page minus its padding on both sides.
    pub fn content_width(&self) -> f32 {
        self.width - self.spacing.page_padding * 2.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Palettes
// ────────────────────────────────────────────────────────────────────────────

/// Background and foreground for one colored region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileColors {
    pub background: String,
    pub text: String,
}

impl TileColors {
    fn new(background: &str, text: &str) -> Self {
        Self {
            background: background.to_string(),
            text: text.to_string(),
        }
    }
}

/// (header bg, header text, body bg, body text), cycled by section index.
const SECTION_PALETTE: [(&str, &str, &str, &str); 4] = [
    ("#264796", "#FFFFFF", "#EEF2FB", "#1F2937"),
    ("#3E3C72", "#FFFFFF", "#F1F0F8", "#1F2937"),
    ("#DCE6F7", "#202B5B", "#FFFFFF", "#1F2937"),
    ("#0F766E", "#FFFFFF", "#ECFDF5", "#1F2937"),
];

/// Header and body colors for the section at `source_index`.
pub fn section_colors(source_index: usize) -> (TileColors, TileColors) {
    let (hbg, htext, bbg, btext) = SECTION_PALETTE[source_index % SECTION_PALETTE.len()];
    (TileColors::new(hbg, htext), TileColors::new(bbg, btext))
}

const KEY_TAKEAWAY_PALETTE: [(&str, &str); 5] = [
    ("#FF6B6B", "#FFFFFF"),
    ("#4ECDC4", "#FFFFFF"),
    ("#45B7D1", "#FFFFFF"),
    ("#96CEB4", "#FFFFFF"),
    ("#FFEAA7", "#2D3436"),
];

/// Number-circle colors for a key point. Indices past the palette use entry 0.
pub fn key_takeaway_colors(color_index: usize) -> TileColors {
    let (bg, text) = KEY_TAKEAWAY_PALETTE
        .get(color_index)
        .copied()
        .unwrap_or(KEY_TAKEAWAY_PALETTE[0]);
    TileColors::new(bg, text)
}

pub const BRAND_BLUE: &str = "#264796";
pub const REFERENCES_BG: &str = "#3E3C72";
pub const IMAGES_BG: &str = "#F2F2F2";
pub const IMAGES_BORDER: &str = "#E5E7EB";
pub const KEY_TILE_BG: &str = "#F7F8FA";
pub const KEY_TILE_BORDER: &str = "#E0E6F6";
pub const CAPTION_GRAY: &str = "#6B7280";

/// Parses `#RRGGBB` (or `RRGGBB`, or `#RGB`) into unit-range RGB.
pub fn parse_hex_color(hex: &str) -> Option<(f32, f32, f32)> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&expanded[range], 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
