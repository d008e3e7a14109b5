//! Display list for the PDF page.
//!
//! Composition works top-down in points from the page's top-left corner and
//! produces [`DrawOp`]s; [`write_ops`] flips them into PDF user space (origin
//! bottom-left) when the content stream is written.

use std::collections::HashMap;

use pdf_writer::{Content, Name, Str};

use crate::layout::font_metrics::{get_metrics, FontFamily};
use crate::layout::theme::parse_hex_color;

/// Control point offset for approximating a quarter circle with one cubic.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn hex(value: &str) -> Option<Self> {
        parse_hex_color(value).map(|(r, g, b)| Rgb { r, g, b })
    }

    /// Parses `value`, falling back to `fallback` (itself a known-good hex).
    pub fn hex_or(value: &str, fallback: &str) -> Self {
        Self::hex(value)
            .or_else(|| Self::hex(fallback))
            .unwrap_or(Rgb {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        fill: Option<Rgb>,
        stroke: Option<(Rgb, f32)>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: Rgb,
    },
    Text {
        x: f32,
        baseline: f32,
        font: FontFamily,
        size: f32,
        color: Rgb,
        text: String,
    },
    /// Raster looked up by `key` in the page's image table.
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        key: String,
    },
}

impl DrawOp {
    fn translated(self, dx: f32, dy: f32) -> Self {
        match self {
            DrawOp::Rect {
                x,
                y,
                w,
                h,
                radius,
                fill,
                stroke,
            } => DrawOp::Rect {
                x: x + dx,
                y: y + dy,
                w,
                h,
                radius,
                fill,
                stroke,
            },
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => DrawOp::Line {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
                color,
                width,
            },
            DrawOp::Circle { cx, cy, r, fill } => DrawOp::Circle {
                cx: cx + dx,
                cy: cy + dy,
                r,
                fill,
            },
            DrawOp::Text {
                x,
                baseline,
                font,
                size,
                color,
                text,
            } => DrawOp::Text {
                x: x + dx,
                baseline: baseline + dy,
                font,
                size,
                color,
                text,
            },
            DrawOp::Image { x, y, w, h, key } => DrawOp::Image {
                x: x + dx,
                y: y + dy,
                w,
                h,
                key,
            },
        }
    }
}

/// Background and border drawn behind a block at its final height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub fill: Option<Rgb>,
    pub border: Option<(Rgb, f32)>,
    pub radius: f32,
}

/// A measured tile: ops relative to its top-left corner.
///
/// `stretch` blocks share leftover column height; their frame grows with them.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: f32,
    pub stretch: bool,
    pub frame: Option<Frame>,
    pub ops: Vec<DrawOp>,
}

impl Block {
    pub fn new(stretch: bool, frame: Option<Frame>) -> Self {
        Self {
            height: 0.0,
            stretch,
            frame,
            ops: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Canvas {
    pub ops: Vec<DrawOp>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Draws `block` with its top-left at (`x`, `y`), `width` wide and
    /// `height` tall (at least the block's measured height).
    pub fn place(&mut self, block: Block, x: f32, y: f32, width: f32, height: f32) {
        if let Some(frame) = block.frame {
            self.ops.push(DrawOp::Rect {
                x,
                y,
                w: width,
                h: height.max(block.height),
                radius: frame.radius,
                fill: frame.fill,
                stroke: frame.border,
            });
        }
        self.ops
            .extend(block.ops.into_iter().map(|op| op.translated(x, y)));
    }
}

/// Pushes already-wrapped lines as text ops; returns the height used.
#[allow(clippy::too_many_arguments)]
pub fn push_lines(
    ops: &mut Vec<DrawOp>,
    lines: &[String],
    x: f32,
    top: f32,
    width: f32,
    align: Align,
    font: FontFamily,
    size: f32,
    line_height: f32,
    color: Rgb,
) -> f32 {
    let metrics = get_metrics(font);
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_x = match align {
            Align::Left => x,
            Align::Center => x + ((width - metrics.measure_pt(line, size)) / 2.0).max(0.0),
        };
        ops.push(DrawOp::Text {
            x: line_x,
            baseline: baseline(top + i as f32 * line_height, line_height, size),
            font,
            size,
            color,
            text: line.clone(),
        });
    }
    lines.len() as f32 * line_height
}

/// Baseline of a line box whose top edge is at `line_top`.
pub fn baseline(line_top: f32, line_height: f32, size: f32) -> f32 {
    line_top + (line_height - size) / 2.0 + size * 0.8
}

// ────────────────────────────────────────────────────────────────────────────
// Text encoding
// ────────────────────────────────────────────────────────────────────────────

/// Encodes `text` for a WinAnsiEncoding base-14 font. Latin-1 passes through,
/// the common typographic punctuation maps to its 0x80..0x9F slot, anything
/// else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Content stream output
// ────────────────────────────────────────────────────────────────────────────

/// Writes `ops` into `content`, flipping y against `page_height`.
/// Image ops whose key has no entry in `image_names` are skipped.
pub fn write_ops(
    content: &mut Content,
    ops: &[DrawOp],
    page_height: f32,
    image_names: &HashMap<String, String>,
) {
    for op in ops {
        match op {
            DrawOp::Rect {
                x,
                y,
                w,
                h,
                radius,
                fill,
                stroke,
            } => {
                if fill.is_none() && stroke.is_none() {
                    continue;
                }
                content.save_state();
                if let Some(color) = fill {
                    content.set_fill_rgb(color.r, color.g, color.b);
                }
                if let Some((color, width)) = stroke {
                    content.set_stroke_rgb(color.r, color.g, color.b);
                    content.set_line_width(*width);
                }
                let bottom = page_height - y - h;
                if *radius > 0.0 {
                    rounded_rect_path(content, *x, bottom, *w, *h, *radius);
                } else {
                    content.rect(*x, bottom, *w, *h);
                }
                match (fill.is_some(), stroke.is_some()) {
                    (true, true) => content.fill_nonzero_and_stroke(),
                    (true, false) => content.fill_nonzero(),
                    _ => content.stroke(),
                };
                content.restore_state();
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                content.save_state();
                content.set_stroke_rgb(color.r, color.g, color.b);
                content.set_line_width(*width);
                content.move_to(*x1, page_height - y1);
                content.line_to(*x2, page_height - y2);
                content.stroke();
                content.restore_state();
            }
            DrawOp::Circle { cx, cy, r, fill } => {
                content.save_state();
                content.set_fill_rgb(fill.r, fill.g, fill.b);
                circle_path(content, *cx, page_height - cy, *r);
                content.fill_nonzero();
                content.restore_state();
            }
            DrawOp::Text {
                x,
                baseline,
                font,
                size,
                color,
                text,
            } => {
                let encoded = encode_win_ansi(text);
                content.save_state();
                content.set_fill_rgb(color.r, color.g, color.b);
                content
                    .begin_text()
                    .set_font(Name(font.resource_name()), *size)
                    .next_line(*x, page_height - baseline)
                    .show(Str(&encoded))
                    .end_text();
                content.restore_state();
            }
            DrawOp::Image { x, y, w, h, key } => {
                let Some(name) = image_names.get(key) else {
                    continue;
                };
                content.save_state();
                content.transform([*w, 0.0, 0.0, *h, *x, page_height - y - h]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
}

fn rounded_rect_path(content: &mut Content, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    let r = radius.min(w / 2.0).min(h / 2.0);
    let k = r * KAPPA;
    let (right, top) = (x + w, y + h);
    content.move_to(x + r, y);
    content.line_to(right - r, y);
    content.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    content.line_to(right, top - r);
    content.cubic_to(right, top - r + k, right - r + k, top, right - r, top);
    content.line_to(x + r, top);
    content.cubic_to(x + r - k, top, x, top - r + k, x, top - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

fn circle_path(content: &mut Content, cx: f32, cy: f32, r: f32) {
    let k = r * KAPPA;
    content.move_to(cx + r, cy);
    content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    content.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi_maps_typographic_punctuation() {
        assert_eq!(encode_win_ansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(encode_win_ansi("“q”"), vec![0x93, b'q', 0x94]);
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("日本"), vec![b'?', b'?']);
    }

    #[test]
    fn test_hex_or_falls_back() {
        assert_eq!(Rgb::hex_or("not a color", "#FFFFFF"), Rgb::WHITE);
        assert_eq!(Rgb::hex_or("#fff", "#000000"), Rgb::WHITE);
    }

    #[test]
    fn test_place_translates_ops_and_stretches_frame() {
        let mut block = Block::new(
            true,
            Some(Frame {
                fill: Some(Rgb::WHITE),
                border: None,
                radius: 4.0,
            }),
        );
        block.height = 50.0;
        block.ops.push(DrawOp::Circle {
            cx: 10.0,
            cy: 10.0,
            r: 5.0,
            fill: Rgb::WHITE,
        });

        let mut canvas = Canvas::new();
        canvas.place(block, 100.0, 200.0, 300.0, 80.0);
        assert_eq!(canvas.ops.len(), 2);
        match &canvas.ops[0] {
            DrawOp::Rect { x, y, w, h, .. } => {
                assert_eq!((*x, *y, *w, *h), (100.0, 200.0, 300.0, 80.0));
            }
            other => panic!("expected frame rect, got {other:?}"),
        }
        match &canvas.ops[1] {
            DrawOp::Circle { cx, cy, .. } => assert_eq!((*cx, *cy), (110.0, 210.0)),
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_push_lines_centers_and_skips_blank() {
        let mut ops = Vec::new();
        let lines = vec!["Title".to_string(), String::new(), "x".to_string()];
        let height = push_lines(
            &mut ops,
            &lines,
            0.0,
            0.0,
            1000.0,
            Align::Center,
            FontFamily::Helvetica,
            20.0,
            24.0,
            Rgb::WHITE,
        );
        assert_eq!(height, 72.0);
        assert_eq!(ops.len(), 2);
        if let DrawOp::Text { x, .. } = &ops[0] {
            let width = get_metrics(FontFamily::Helvetica).measure_pt("Title", 20.0);
            assert!((x - (1000.0 - width) / 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_write_ops_produces_operators() {
        let ops = vec![
            DrawOp::Rect {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
                radius: 2.0,
                fill: Some(Rgb::WHITE),
                stroke: None,
            },
            DrawOp::Text {
                x: 5.0,
                baseline: 20.0,
                font: FontFamily::Helvetica,
                size: 12.0,
                color: Rgb::WHITE,
                text: "Hi".to_string(),
            },
            DrawOp::Image {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 1.0,
                key: "missing".to_string(),
            },
        ];
        let mut content = Content::new();
        write_ops(&mut content, &ops, 100.0, &HashMap::new());
        let bytes = content.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("BT"));
        assert!(text.contains("(Hi) Tj"));
        assert!(!text.contains(" Do"));
    }
}
