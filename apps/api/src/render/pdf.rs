//! Single-page A0 PDF composition.
//!
//! # Page structure
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ title (centered, wraps)            [QR]    │  header row
//! │────────────────────────────────────────────│
//! │  authors   │   institution   │   contact   │  subtitle row
//! │────────────────────────────────────────────│
//! │ col 0      │ col 1      │ col C-1          │  grid
//! │ tiles...   │ tiles...   │ ... key / refs   │
//! └────────────────────────────────────────────┘
//! ```
//! [`compose_page`] measures every tile with the static font metrics and
//! lays the page out as a display list; [`render_pdf`] serializes it. The
//! composition is CPU-bound and runs under `spawn_blocking` at export time.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, TextStr};
use tracing::{debug, warn};

use crate::layout::column_count::WidthBudget;
use crate::layout::font_metrics::{get_metrics, FontFamily, FontPairing};
use crate::layout::items::{ContentItem, ImageRef, KeyPoint};
use crate::layout::placer::LayoutPlan;
use crate::layout::theme::{
    key_takeaway_colors, PosterTheme, TileColors, BRAND_BLUE, CAPTION_GRAY, IMAGES_BG,
    IMAGES_BORDER, KEY_TILE_BG, KEY_TILE_BORDER, REFERENCES_BG,
};
use crate::models::poster::{DesignSettings, PosterData};
use crate::render::canvas::{
    baseline, push_lines, write_ops, Align, Block, Canvas, DrawOp, Frame, Rgb,
};
use crate::render::images::RasterImage;

/// Image table key of the header QR code.
pub const QR_IMAGE_KEY: &str = "qr";
const TITLE_LINE_HEIGHT: f32 = 1.2;
const BODY_LINE_HEIGHT: f32 = 1.6;
const CAPTION_LINE_HEIGHT: f32 = 1.3;
const IMAGES_TILE_TITLE: &str = "Images";
const KEY_TAKEAWAYS_TITLE: &str = "Key Takeaways";
const IMAGE_UNAVAILABLE: &str = "Image unavailable";

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ────────────────────────────────────────────────────────────────────────────

/// Rasters fetched before composition. Missing entries draw placeholders.
#[derive(Debug, Clone, Default)]
pub struct PdfAssets {
    /// Whether the header should carry a QR block at all.
    pub qr_requested: bool,
    pub qr: Option<RasterImage>,
    /// Poster figures keyed by URL.
    pub images: HashMap<String, RasterImage>,
}

impl PdfAssets {
    fn raster(&self, key: &str) -> Option<&RasterImage> {
        if key == QR_IMAGE_KEY {
            self.qr.as_ref()
        } else {
            self.images.get(key)
        }
    }
}

/// The laid-out page before serialization.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
    pub grid_top: f32,
    pub grid_bottom: f32,
    /// Natural (unstretched) content height per column.
    pub column_heights: Vec<f32>,
    pub overflowing_columns: Vec<usize>,
}

struct Style<'a> {
    theme: &'a PosterTheme,
    fonts: FontPairing,
    title_color: Rgb,
    header_bg: Rgb,
    key_text: Rgb,
    brand: Rgb,
}

impl<'a> Style<'a> {
    fn new(theme: &'a PosterTheme, design: &DesignSettings) -> Self {
        Self {
            theme,
            fonts: FontPairing::for_design(&design.title_font, &design.content_font),
            title_color: Rgb::hex_or(&design.header_text_color, BRAND_BLUE),
            header_bg: Rgb::hex_or(&design.header_bg_color, "#FFFFFF"),
            key_text: Rgb::hex_or(&design.key_points_text_color, BRAND_BLUE),
            brand: Rgb::hex_or(BRAND_BLUE, BRAND_BLUE),
        }
    }

    fn wrap(&self, text: &str, font: FontFamily, size: f32, width: f32) -> Vec<String> {
        get_metrics(font).wrap_lines(text, size, width.max(1.0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page composition
// ────────────────────────────────────────────────────────────────────────────

pub fn compose_page(
    poster: &PosterData,
    design: &DesignSettings,
    plan: &LayoutPlan,
    assets: &PdfAssets,
    theme: &PosterTheme,
) -> ComposedPage {
    let style = Style::new(theme, design);
    let mut canvas = Canvas::new();

    let header_end = compose_header(&mut canvas, poster, assets, &style);
    let grid_top = compose_subtitle_row(&mut canvas, poster, header_end, &style);
    let grid_bottom = theme.height - theme.spacing.page_padding;

    let (column_heights, overflowing_columns) =
        compose_grid(&mut canvas, plan, assets, grid_top, grid_bottom, &style);

    ComposedPage {
        width: theme.width,
        height: theme.height,
        ops: canvas.ops,
        grid_top,
        grid_bottom,
        column_heights,
        overflowing_columns,
    }
}

/// Title and QR block. Returns the y where the subtitle row starts.
fn compose_header(
    canvas: &mut Canvas,
    poster: &PosterData,
    assets: &PdfAssets,
    style: &Style,
) -> f32 {
    let theme = style.theme;
    let pad = theme.spacing.page_padding;
    let content_width = theme.content_width();
    let header_margin = theme.spacing.header_margin;

    // Header band behind title and subtitle; the subtitle row extends it.
    let band_index = canvas.ops.len();
    canvas.push(DrawOp::Rect {
        x: 0.0,
        y: 0.0,
        w: theme.width,
        h: 0.0,
        radius: 0.0,
        fill: Some(style.header_bg),
        stroke: None,
    });

    let qr_block_width = theme.spacing.key_circle * 2.1;
    let title_width = if assets.qr_requested {
        content_width - qr_block_width - header_margin * 1.5
    } else {
        content_width
    };

    let title_size = theme.font_sizes.title;
    let title_lines = style.wrap(&poster.title, style.fonts.heading, title_size, title_width);
    let title_height = push_lines(
        &mut canvas.ops,
        &title_lines,
        pad,
        pad,
        title_width,
        Align::Center,
        style.fonts.heading,
        title_size,
        title_size * TITLE_LINE_HEIGHT,
        style.title_color,
    );

    let mut qr_height = 0.0;
    if assets.qr_requested {
        let qr_size = theme.spacing.key_circle * 1.6;
        let block_x = pad + content_width - qr_block_width;
        let qr_x = block_x + (qr_block_width - qr_size) / 2.0;
        if assets.qr.is_some() {
            canvas.push(DrawOp::Image {
                x: qr_x,
                y: pad,
                w: qr_size,
                h: qr_size,
                key: QR_IMAGE_KEY.to_string(),
            });
        } else {
            canvas.push(DrawOp::Rect {
                x: qr_x,
                y: pad,
                w: qr_size,
                h: qr_size,
                radius: 0.0,
                fill: None,
                stroke: Some((style.brand, 1.0)),
            });
        }
        qr_height = qr_size + header_margin / 4.0;

        if let Some(caption) = poster.qr_code_caption.as_deref().filter(|c| !c.trim().is_empty()) {
            let caption_font = style.fonts.body.bold();
            let size = theme.font_sizes.qr_caption;
            let lines = style.wrap(caption, caption_font, size, qr_block_width);
            qr_height += push_lines(
                &mut canvas.ops,
                &lines,
                block_x,
                pad + qr_height,
                qr_block_width,
                Align::Center,
                caption_font,
                size,
                size * TITLE_LINE_HEIGHT,
                style.brand,
            );
        }
    }

    let header_end = pad + title_height.max(qr_height) + header_margin;
    if let DrawOp::Rect { h, .. } = &mut canvas.ops[band_index] {
        *h = header_end;
    }
    header_end
}

/// Authors, institution and contact in three equal cells between two rules.
/// Returns the y where the grid starts.
fn compose_subtitle_row(canvas: &mut Canvas, poster: &PosterData, top: f32, style: &Style) -> f32 {
    let theme = style.theme;
    let pad = theme.spacing.page_padding;
    let content_width = theme.content_width();
    let header_margin = theme.spacing.header_margin;
    let rule = theme.border.subtitle;
    let size = theme.font_sizes.subtitle;
    let line_height = size * TITLE_LINE_HEIGHT;
    let cell_width = content_width / 3.0;

    let top_rule = top + header_margin / 2.0;
    let text_top = top_rule + rule + header_margin;

    let mut row_height = line_height;
    for (i, text) in [&poster.authors, &poster.school, &poster.contact]
        .into_iter()
        .enumerate()
    {
        let lines = style.wrap(text.trim(), style.fonts.heading, size, cell_width);
        let height = push_lines(
            &mut canvas.ops,
            &lines,
            pad + cell_width * i as f32,
            text_top,
            cell_width,
            Align::Center,
            style.fonts.heading,
            size,
            line_height,
            style.brand,
        );
        row_height = row_height.max(height);
    }

    let bottom_rule = text_top + row_height + header_margin;
    for y in [top_rule + rule / 2.0, bottom_rule + rule / 2.0] {
        canvas.push(DrawOp::Line {
            x1: pad,
            y1: y,
            x2: pad + content_width,
            y2: y,
            color: style.brand,
            width: rule,
        });
    }

    // Extend the header band through the subtitle row.
    if let Some(DrawOp::Rect { h, .. }) = canvas.ops.first_mut() {
        *h = bottom_rule + rule;
    }

    bottom_rule + rule + theme.spacing.subtitle_margin
}

/// Places every column's tiles. Returns natural column heights and the
/// indices of columns that do not fit above the bottom padding.
fn compose_grid(
    canvas: &mut Canvas,
    plan: &LayoutPlan,
    assets: &PdfAssets,
    grid_top: f32,
    grid_bottom: f32,
    style: &Style,
) -> (Vec<f32>, Vec<usize>) {
    let theme = style.theme;
    let budget = WidthBudget::for_theme(theme);
    let column_width = budget.column_width(plan.column_count());
    let gap = theme.spacing.tile_gap;
    let available = grid_bottom - grid_top;

    let mut heights = Vec::with_capacity(plan.column_count());
    let mut overflowing = Vec::new();

    for (index, column) in plan.columns.iter().enumerate() {
        let x = theme.spacing.page_padding + index as f32 * (column_width + gap);
        let blocks: Vec<Block> = column
            .iter()
            .map(|item| compose_tile(item, column_width, assets, style))
            .collect();

        let natural: f32 = blocks.iter().map(|b| b.height).sum::<f32>()
            + gap * blocks.len().saturating_sub(1) as f32;
        heights.push(natural);

        let stretchers = blocks.iter().filter(|b| b.stretch).count();
        let extra = if natural > available {
            warn!(
                column = index,
                overflow_pt = natural - available,
                "Poster column overflows the page"
            );
            overflowing.push(index);
            0.0
        } else if stretchers > 0 {
            (available - natural) / stretchers as f32
        } else {
            0.0
        };

        let mut y = grid_top;
        for block in blocks {
            let height = block.height + if block.stretch { extra } else { 0.0 };
            canvas.place(block, x, y, column_width, height);
            y += height + gap;
        }
    }

    debug!(columns = plan.column_count(), column_width, "Composed poster grid");
    (heights, overflowing)
}

fn compose_tile(item: &ContentItem, width: f32, assets: &PdfAssets, style: &Style) -> Block {
    match item {
        ContentItem::Section {
            title,
            body,
            header_color,
            body_color,
            ..
        } => section_tile(title, body, header_color, body_color, width, style),
        ContentItem::ImageBlock { images, .. } => images_tile(images, width, assets, style),
        ContentItem::KeyTakeaways { points } => key_takeaways_block(points, width, style),
        ContentItem::References { title, lines } => references_tile(title, lines, width, style),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tiles
// ────────────────────────────────────────────────────────────────────────────

/// Colored header strip with a rule beneath. Returns its height.
fn tile_header(
    ops: &mut Vec<DrawOp>,
    title: &str,
    width: f32,
    fill: Rgb,
    text: Rgb,
    rule: Rgb,
    style: &Style,
) -> f32 {
    let theme = style.theme;
    let padding = theme.spacing.section_padding * 0.7;
    let size = theme.font_sizes.section_header;
    let lines = style.wrap(title, style.fonts.heading, size, width - padding * 2.0);
    if lines.is_empty() {
        return 0.0;
    }
    let height = padding * 2.0 + lines.len() as f32 * size * TITLE_LINE_HEIGHT;
    let inset = theme.border.tile;

    // Rounded top corners, square bottom edge.
    ops.push(DrawOp::Rect {
        x: inset,
        y: inset,
        w: width - inset * 2.0,
        h: height - inset,
        radius: (theme.radius.tile - inset).max(0.0),
        fill: Some(fill),
        stroke: None,
    });
    ops.push(DrawOp::Rect {
        x: inset,
        y: height / 2.0,
        w: width - inset * 2.0,
        h: height / 2.0,
        radius: 0.0,
        fill: Some(fill),
        stroke: None,
    });
    push_lines(
        ops,
        &lines,
        padding,
        padding,
        width - padding * 2.0,
        Align::Left,
        style.fonts.heading,
        size,
        size * TITLE_LINE_HEIGHT,
        text,
    );
    ops.push(DrawOp::Line {
        x1: inset,
        y1: height,
        x2: width - inset,
        y2: height,
        color: rule,
        width: theme.border.section_header,
    });
    height
}

fn section_tile(
    title: &str,
    body: &str,
    header: &TileColors,
    body_colors: &TileColors,
    width: f32,
    style: &Style,
) -> Block {
    let theme = style.theme;
    let header_bg = Rgb::hex_or(&header.background, BRAND_BLUE);
    let header_text = Rgb::hex_or(&header.text, "#FFFFFF");
    let body_bg = Rgb::hex_or(&body_colors.background, "#FFFFFF");
    let body_text = Rgb::hex_or(&body_colors.text, "#1F2937");

    let mut block = Block::new(
        true,
        Some(Frame {
            fill: Some(body_bg),
            border: Some((header_bg, theme.border.tile)),
            radius: theme.radius.tile,
        }),
    );

    let header_height = tile_header(
        &mut block.ops,
        title,
        width,
        header_bg,
        header_text,
        header_text,
        style,
    );

    let padding = theme.spacing.section_padding;
    let size = theme.font_sizes.body;
    let lines = style.wrap(body, style.fonts.body, size, width - padding * 2.0);
    let body_height = push_lines(
        &mut block.ops,
        &lines,
        padding,
        header_height + padding,
        width - padding * 2.0,
        Align::Left,
        style.fonts.body,
        size,
        size * BODY_LINE_HEIGHT,
        body_text,
    );

    block.height = header_height + padding * 2.0 + body_height;
    block
}

fn images_tile(images: &[ImageRef], width: f32, assets: &PdfAssets, style: &Style) -> Block {
    let theme = style.theme;
    let images_bg = Rgb::hex_or(IMAGES_BG, "#F2F2F2");
    let images_border = Rgb::hex_or(IMAGES_BORDER, "#E5E7EB");
    let caption_color = Rgb::hex_or(CAPTION_GRAY, "#6B7280");

    let mut block = Block::new(
        true,
        Some(Frame {
            fill: Some(images_bg),
            border: Some((images_border, theme.border.tile)),
            radius: theme.radius.tile,
        }),
    );
    let mut y = tile_header(
        &mut block.ops,
        IMAGES_TILE_TITLE,
        width,
        images_bg,
        style.brand,
        images_border,
        style,
    );

    let padding = theme.spacing.section_padding;
    let inner_width = width - padding * 2.0;
    let caption_size = theme.font_sizes.body * 0.8;
    let caption_line = caption_size * CAPTION_LINE_HEIGHT;
    y += padding;

    for (i, image) in images.iter().enumerate() {
        if i > 0 {
            y += padding / 2.0;
        }
        if let Some(upper) = image.upper_caption.as_deref() {
            let lines = style.wrap(upper, style.fonts.body, caption_size, inner_width);
            y += push_lines(
                &mut block.ops,
                &lines,
                padding,
                y,
                inner_width,
                Align::Left,
                style.fonts.body,
                caption_size,
                caption_line,
                caption_color,
            ) + 4.0;
        }

        match assets.raster(&image.url) {
            Some(raster) => {
                let h = (inner_width * raster.aspect_ratio()).min(inner_width * 1.25);
                block.ops.push(DrawOp::Image {
                    x: padding,
                    y,
                    w: inner_width,
                    h,
                    key: image.url.clone(),
                });
                y += h;
            }
            None => {
                let h = inner_width * 0.5;
                block.ops.push(DrawOp::Rect {
                    x: padding,
                    y,
                    w: inner_width,
                    h,
                    radius: 0.0,
                    fill: Some(images_border),
                    stroke: None,
                });
                let label_width =
                    get_metrics(style.fonts.body).measure_pt(IMAGE_UNAVAILABLE, caption_size);
                block.ops.push(DrawOp::Text {
                    x: padding + ((inner_width - label_width) / 2.0).max(0.0),
                    baseline: baseline(y + (h - caption_line) / 2.0, caption_line, caption_size),
                    font: style.fonts.body,
                    size: caption_size,
                    color: caption_color,
                    text: IMAGE_UNAVAILABLE.to_string(),
                });
                y += h;
            }
        }

        if !image.caption.trim().is_empty() {
            let lines = style.wrap(&image.caption, style.fonts.body, caption_size, inner_width);
            y += 4.0;
            y += push_lines(
                &mut block.ops,
                &lines,
                padding,
                y,
                inner_width,
                Align::Left,
                style.fonts.body,
                caption_size,
                caption_line,
                caption_color,
            );
        }
    }

    block.height = y + padding;
    block
}

fn key_takeaways_block(points: &[KeyPoint], width: f32, style: &Style) -> Block {
    let theme = style.theme;
    let margin = theme.spacing.key_takeaway_margin;
    let circle = theme.spacing.key_circle;
    let circle_margin = circle / 3.5;
    let tile_bg = Rgb::hex_or(KEY_TILE_BG, "#F7F8FA");
    let tile_border = Rgb::hex_or(KEY_TILE_BORDER, "#E0E6F6");

    let mut block = Block::new(false, None);
    let mut y = margin;

    // ── header: rule, label, rule ──
    let label_size = theme.font_sizes.section_header * 0.88;
    let label_width = get_metrics(style.fonts.heading).measure_pt(KEY_TAKEAWAYS_TITLE, label_size);
    let row_height = label_size * TITLE_LINE_HEIGHT;
    let rule_length = ((width - label_width - margin * 2.0) / 2.0).max(0.0);
    let rule_y = y + row_height / 2.0;
    for x1 in [0.0, rule_length + margin * 2.0 + label_width] {
        block.ops.push(DrawOp::Line {
            x1,
            y1: rule_y,
            x2: x1 + rule_length,
            y2: rule_y,
            color: style.brand,
            width: theme.border.key_takeaway,
        });
    }
    block.ops.push(DrawOp::Text {
        x: rule_length + margin,
        baseline: baseline(y, row_height, label_size),
        font: style.fonts.heading,
        size: label_size,
        color: style.brand,
        text: KEY_TAKEAWAYS_TITLE.to_string(),
    });
    y += row_height + margin;

    // ── one tile per point ──
    let text_x = circle_margin * 2.0 + circle;
    let text_width = width - text_x - circle_margin;
    let point_size = theme.font_sizes.key_takeaway;
    let desc_size = theme.font_sizes.body * 0.73;
    let vertical_padding = circle / 4.5;

    for (position, point) in points.iter().enumerate() {
        let point_lines = style.wrap(&point.text, style.fonts.heading, point_size, text_width);
        let desc_lines = style.wrap(&point.description, style.fonts.body, desc_size, text_width);
        let point_height = point_lines.len() as f32 * point_size * TITLE_LINE_HEIGHT;
        let desc_height = if desc_lines.is_empty() {
            0.0
        } else {
            circle / 14.0 + desc_lines.len() as f32 * desc_size * CAPTION_LINE_HEIGHT
        };
        let text_height = point_height + desc_height;
        let tile_height = (circle * 1.3)
            .max(circle + circle_margin * 2.0)
            .max(text_height + vertical_padding * 2.0);

        block.ops.push(DrawOp::Rect {
            x: 0.0,
            y,
            w: width,
            h: tile_height,
            radius: theme.radius.key_takeaway,
            fill: Some(tile_bg),
            stroke: Some((tile_border, theme.border.key_takeaway)),
        });

        let colors = key_takeaway_colors(point.color_index);
        let cx = circle_margin + circle / 2.0;
        let cy = y + tile_height / 2.0;
        block.ops.push(DrawOp::Circle {
            cx,
            cy,
            r: circle / 2.0,
            fill: Rgb::hex_or(&colors.background, "#0007DB"),
        });
        let number = (position + 1).to_string();
        let number_size = theme.spacing.key_circle_text;
        let number_width = get_metrics(style.fonts.heading).measure_pt(&number, number_size);
        block.ops.push(DrawOp::Text {
            x: cx - number_width / 2.0,
            baseline: cy + number_size * 0.35,
            font: style.fonts.heading,
            size: number_size,
            color: Rgb::hex_or(&colors.text, "#FFFFFF"),
            text: number,
        });

        let text_top = y + (tile_height - text_height) / 2.0;
        push_lines(
            &mut block.ops,
            &point_lines,
            text_x,
            text_top,
            text_width,
            Align::Left,
            style.fonts.heading,
            point_size,
            point_size * TITLE_LINE_HEIGHT,
            style.key_text,
        );
        push_lines(
            &mut block.ops,
            &desc_lines,
            text_x,
            text_top + point_height + circle / 14.0,
            text_width,
            Align::Left,
            style.fonts.body,
            desc_size,
            desc_size * CAPTION_LINE_HEIGHT,
            style.key_text,
        );

        y += tile_height + margin;
    }

    block.height = y;
    block
}

fn references_tile(title: &str, lines: &[String], width: f32, style: &Style) -> Block {
    let theme = style.theme;
    let padding = theme.spacing.section_padding;
    let inner_width = width - padding * 2.0;
    let top = theme.spacing.key_takeaway_margin;

    let mut block = Block::new(false, None);
    let frame_index = block.ops.len();
    block.ops.push(DrawOp::Rect {
        x: 0.0,
        y: top,
        w: width,
        h: 0.0,
        radius: theme.radius.reference,
        fill: Some(Rgb::hex_or(REFERENCES_BG, "#3E3C72")),
        stroke: None,
    });

    let mut y = top + padding;
    let header_size = theme.font_sizes.section_header * 0.69;
    let header_lines = style.wrap(title, style.fonts.heading, header_size, inner_width);
    y += push_lines(
        &mut block.ops,
        &header_lines,
        padding,
        y,
        inner_width,
        Align::Left,
        style.fonts.heading,
        header_size,
        header_size * TITLE_LINE_HEIGHT,
        Rgb::WHITE,
    );
    y += theme.spacing.reference_margin;

    let size = theme.font_sizes.reference;
    for reference in lines {
        let wrapped = style.wrap(reference, style.fonts.body, size, inner_width);
        y += push_lines(
            &mut block.ops,
            &wrapped,
            padding,
            y,
            inner_width,
            Align::Left,
            style.fonts.body,
            size,
            size * TITLE_LINE_HEIGHT,
            Rgb::WHITE,
        );
        y += theme.spacing.reference_margin / 3.0;
    }
    y += padding;

    if let DrawOp::Rect { h, .. } = &mut block.ops[frame_index] {
        *h = y - top;
    }
    block.height = y;
    block
}

// ────────────────────────────────────────────────────────────────────────────
// Serialization
// ────────────────────────────────────────────────────────────────────────────

/// Serializes a composed page into a complete PDF document.
pub fn render_pdf(
    page: &ComposedPage,
    assets: &PdfAssets,
    title: &str,
    created: DateTime<Utc>,
) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let pages_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let info_id = alloc.bump();

    let mut pdf = Pdf::new();

    let font_refs: Vec<(FontFamily, Ref)> = FontFamily::ALL
        .iter()
        .map(|family| (*family, alloc.bump()))
        .collect();
    for (family, id) in &font_refs {
        pdf.type1_font(*id)
            .base_font(Name(family.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    // Embed each distinct raster the page references once.
    let keys: BTreeSet<&str> = page
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Image { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();
    let mut image_names: HashMap<String, String> = HashMap::new();
    let mut image_refs: Vec<(String, Ref)> = Vec::new();
    for key in keys {
        let Some(raster) = assets.raster(key) else {
            continue;
        };
        let id = alloc.bump();
        let name = format!("Im{}", image_refs.len() + 1);

        // Transparency travels as a DeviceGray soft mask.
        let mask_id = raster.alpha.as_ref().map(|alpha| {
            let mask_id = alloc.bump();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
            let mut mask = pdf.image_xobject(mask_id, &compressed);
            mask.filter(Filter::FlateDecode);
            mask.width(raster.width as i32);
            mask.height(raster.height as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            mask_id
        });

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raster.rgb, 6);
        let mut xobject = pdf.image_xobject(id, &compressed);
        xobject.filter(Filter::FlateDecode);
        xobject.width(raster.width as i32);
        xobject.height(raster.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            xobject.s_mask(mask_id);
        }
        drop(xobject);
        image_names.insert(key.to_string(), name.clone());
        image_refs.push((name, id));
    }

    let mut content = Content::new();
    write_ops(&mut content, &page.ops, page.height, &image_names);
    let raw = content.finish();
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
    pdf.stream(content_id, &compressed)
        .filter(Filter::FlateDecode);

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids([page_id]).count(1);

    {
        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page.width, page.height))
            .parent(pages_id)
            .contents(content_id);
        let mut resources = pdf_page.resources();
        {
            let mut fonts = resources.fonts();
            for (family, id) in &font_refs {
                fonts.pair(Name(family.resource_name()), *id);
            }
        }
        if !image_refs.is_empty() {
            let mut x_objects = resources.x_objects();
            for (name, id) in &image_refs {
                x_objects.pair(Name(name.as_bytes()), *id);
            }
        }
    }

    let date = Date::new(created.year() as u16)
        .month(created.month() as u8)
        .day(created.day() as u8)
        .hour(created.hour() as u8)
        .minute(created.minute() as u8)
        .second(created.second() as u8);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(env!("CARGO_PKG_NAME")))
        .creation_date(date);

    pdf.finish()
}

/// Composes and serializes the poster in one step.
pub fn compose_poster_pdf(
    poster: &PosterData,
    design: &DesignSettings,
    plan: &LayoutPlan,
    assets: &PdfAssets,
    theme: &PosterTheme,
    created: DateTime<Utc>,
) -> Vec<u8> {
    let page = compose_page(poster, design, plan, assets, theme);
    render_pdf(&page, assets, &poster.title, created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::theme::POSTER_THEME;
    use crate::layout::{plan_poster, ResolvedLayout};
    use crate::models::poster::{PosterImage, PosterSection};
    use crate::render::images::tests::solid_image;

    const FIGURE_URL: &str = "https://example.org/fig.png";

    fn poster(body_len: usize) -> PosterData {
        PosterData {
            title: "Coral Reef Recovery After Bleaching Events".to_string(),
            authors: "A. Diver, B. Snorkel".to_string(),
            school: "Marine Institute".to_string(),
            contact: "reef@example.org".to_string(),
            sections: (0..4)
                .map(|i| PosterSection {
                    title: format!("Section {}", i + 1),
                    content: "Lorem ipsum dolor sit amet. ".repeat(body_len),
                })
                .collect(),
            images: vec![PosterImage {
                url: FIGURE_URL.to_string(),
                caption: "Figure 1".to_string(),
                upper_caption: Some("Survey sites".to_string()),
                visible: None,
            }],
            keypoints: vec!["Recovery is fast".into(), "Heat is the driver".into()],
            key_descriptions: vec!["Within five years".into()],
            references: "Ref A\nRef B".to_string(),
            qr_code_url: Some("https://example.org".to_string()),
            ..Default::default()
        }
    }

    fn layout(p: &PosterData) -> ResolvedLayout {
        plan_poster(p, &DesignSettings::default(), None)
    }

    fn frames(page: &ComposedPage) -> Vec<(f32, f32, f32, f32)> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect {
                    x,
                    y,
                    w,
                    h,
                    stroke: Some(_),
                    radius,
                    ..
                } if *radius == POSTER_THEME.radius.tile => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_grid_starts_below_header() {
        let p = poster(3);
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &PdfAssets::default(),
            &POSTER_THEME,
        );
        assert!(page.grid_top > POSTER_THEME.spacing.page_padding + POSTER_THEME.font_sizes.title);
        assert_eq!(page.grid_bottom, 3370.0 - 56.0);
        assert!(page.overflowing_columns.is_empty());
    }

    #[test]
    fn test_tiles_align_to_columns() {
        let p = poster(3);
        let resolved = layout(&p);
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &resolved.plan,
            &PdfAssets::default(),
            &POSTER_THEME,
        );
        let budget = WidthBudget::for_theme(&POSTER_THEME);
        let width = budget.column_width(resolved.column_count);
        let column_xs: Vec<f32> = (0..resolved.column_count)
            .map(|i| 56.0 + i as f32 * (width + 36.0))
            .collect();
        let tile_frames = frames(&page);
        // 4 sections + image block carry a tile frame.
        assert_eq!(tile_frames.len(), 5);
        for (x, _, w, _) in tile_frames {
            assert!((w - width).abs() < 1e-3);
            assert!(column_xs.iter().any(|cx| (cx - x).abs() < 1e-3));
        }
    }

    #[test]
    fn test_stretch_tiles_fill_column() {
        let p = poster(3);
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &PdfAssets::default(),
            &POSTER_THEME,
        );
        // Column 0 holds only sections: its last tile ends at the grid bottom.
        let first_x = 56.0;
        let bottom = frames(&page)
            .into_iter()
            .filter(|(x, ..)| (*x - first_x).abs() < 1e-3)
            .map(|(_, y, _, h)| y + h)
            .fold(0.0_f32, f32::max);
        assert!((bottom - page.grid_bottom).abs() < 1e-2, "bottom = {bottom}");
    }

    #[test]
    fn test_overflow_is_reported() {
        let p = poster(600);
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &PdfAssets::default(),
            &POSTER_THEME,
        );
        assert!(!page.overflowing_columns.is_empty());
        for index in &page.overflowing_columns {
            assert!(page.column_heights[*index] > page.grid_bottom - page.grid_top);
        }
    }

    #[test]
    fn test_missing_rasters_draw_placeholders() {
        let p = poster(3);
        let assets = PdfAssets {
            qr_requested: true,
            ..Default::default()
        };
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &assets,
            &POSTER_THEME,
        );
        assert!(!page.ops.iter().any(|op| matches!(op, DrawOp::Image { .. })));
        assert!(page.ops.iter().any(|op| matches!(
            op,
            DrawOp::Text { text, .. } if text == IMAGE_UNAVAILABLE
        )));
    }

    #[test]
    fn test_present_rasters_are_drawn() {
        let p = poster(3);
        let assets = PdfAssets {
            qr_requested: true,
            qr: Some(solid_image(4, 4)),
            images: HashMap::from([(FIGURE_URL.to_string(), solid_image(8, 4))]),
        };
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &assets,
            &POSTER_THEME,
        );
        let keys: Vec<&str> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        assert!(keys.contains(&QR_IMAGE_KEY));
        assert!(keys.contains(&FIGURE_URL));
    }

    #[test]
    fn test_key_points_numbered_by_position() {
        let p = poster(3);
        let page = compose_page(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &PdfAssets::default(),
            &POSTER_THEME,
        );
        let circles = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count();
        assert_eq!(circles, 2);
        for label in ["1", "2"] {
            assert!(page
                .ops
                .iter()
                .any(|op| matches!(op, DrawOp::Text { text, .. } if text == label)));
        }
    }

    #[test]
    fn test_render_pdf_document_structure() {
        let p = poster(3);
        let assets = PdfAssets {
            qr_requested: true,
            qr: Some(solid_image(4, 4)),
            images: HashMap::new(),
        };
        let bytes = compose_poster_pdf(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &assets,
            &POSTER_THEME,
            Utc::now(),
        );
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(text.contains("/MediaBox [0 0 2384 3370]"));
        assert!(text.contains("/BaseFont /Times-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/Im1"));
        assert!(text.contains("/Title"));
        assert!(!text.contains("/SMask"));
    }

    #[test]
    fn test_transparent_figure_gets_soft_mask() {
        let p = poster(3);
        let figure = crate::render::images::decode_raster(
            &crate::render::images::tests::png_bytes(2, 2, [0, 0, 0, 0]),
            crate::render::images::decode_limits(),
        )
        .unwrap();
        let assets = PdfAssets {
            qr_requested: false,
            qr: None,
            images: HashMap::from([(FIGURE_URL.to_string(), figure)]),
        };
        let bytes = compose_poster_pdf(
            &p,
            &DesignSettings::default(),
            &layout(&p).plan,
            &assets,
            &POSTER_THEME,
            Utc::now(),
        );
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/SMask"));
        assert!(text.contains("/DeviceGray"));
    }
}
