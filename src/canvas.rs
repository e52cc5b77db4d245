//! Capture layout – the frozen representation between layout computation
//! and rasterization. It encodes exactly what gets painted where, in CSS
//! pixels relative to the top-left of the capture surface, and can be dumped
//! as JSON to inspect a capture.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::style::{Color, FontWeight, Radius, TextAlign};

/// A complete capture surface ready for painting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureLayout {
    pub width: f32,
    pub height: f32,
    pub root: CanvasBox,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[u8; 4]>,
    pub border: Option<BorderPaint>,
    /// Corner radius in px, already clamped to the box.
    pub radius: f32,

    pub text: Option<TextPaint>,
    pub image: Option<ImagePaint>,
    pub marker: Option<TextPaint>,

    pub children: Vec<CanvasBox>,
}

/// Per-side border widths: top, right, bottom, left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderPaint {
    pub widths: [f32; 4],
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPaint {
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Left edge of the line, absolute.
    pub x: f32,
    /// Baseline, absolute.
    pub baseline: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePaint {
    pub src: String,
}

impl CaptureLayout {
    /// Freeze a laid-out tree.
    pub fn from_layout(root: &PositionedBox, fonts: &FontManager) -> Self {
        Self {
            width: root.width,
            height: root.height,
            root: build_canvas_box(root, fonts),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Capture(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(|e| ExportError::Capture(e.to_string()))
    }

    /// Every text line in paint order, for inspection and tests.
    pub fn text_lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_lines(&self.root, &mut out);
        out
    }
}

fn collect_lines<'a>(b: &'a CanvasBox, out: &mut Vec<&'a str>) {
    if let Some(t) = &b.text {
        out.extend(t.lines.iter().map(|l| l.text.as_str()));
    }
    for c in &b.children {
        collect_lines(c, out);
    }
}

fn rgba(c: Color) -> [u8; 4] {
    c.to_rgba8()
}

fn build_canvas_box(pbox: &PositionedBox, fonts: &FontManager) -> CanvasBox {
    let s = &pbox.style;
    let bold = s.font_weight == FontWeight::Bold;

    let background_color = (!s.background_color.is_transparent()).then(|| rgba(s.background_color));
    let border = (!s.border.is_zero() && !s.border_color.is_transparent()).then(|| BorderPaint {
        widths: [s.border.top, s.border.right, s.border.bottom, s.border.left],
        color: rgba(s.border_color),
    });
    let half = pbox.width.min(pbox.height) / 2.0;
    let radius = match s.border_radius {
        Radius::None => 0.0,
        Radius::Px(r) => r.min(half),
        Radius::Full => half,
    };

    let line_height = fonts.line_height_px(s.font_size, s.line_height);
    // Centre the glyphs in the line box the way browsers split leading.
    let ascent = fonts.ascender_px(s.font_size, bold);
    let baseline_offset = (line_height - s.font_size) / 2.0 + ascent;

    let mut text = None;
    let mut image = None;
    let mut marker = None;
    match &pbox.content {
        BoxContent::Text { lines } => {
            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let slack = (pbox.width - line.width).max(0.0);
                    let x_offset = match s.text_align {
                        TextAlign::Left => 0.0,
                        TextAlign::Center => slack / 2.0,
                        TextAlign::Right => slack,
                    };
                    TextLine {
                        text: line.text.clone(),
                        x: pbox.x + x_offset,
                        baseline: pbox.y + i as f32 * line_height + baseline_offset,
                        width: line.width,
                    }
                })
                .collect();
            text = Some(TextPaint {
                lines: text_lines,
                font_size: s.font_size,
                bold,
                color: rgba(s.color),
            });
        }
        BoxContent::Image { src } => {
            image = Some(ImagePaint { src: src.clone() });
        }
        BoxContent::ListItem { marker: glyph } => {
            let width = fonts.measure_text_width(glyph, s.font_size, bold);
            marker = Some(TextPaint {
                lines: vec![TextLine {
                    text: glyph.clone(),
                    x: pbox.x - width - s.font_size * 0.5,
                    baseline: pbox.y + baseline_offset,
                    width,
                }],
                font_size: s.font_size,
                bold,
                color: rgba(s.color),
            });
        }
        BoxContent::None => {}
    }

    CanvasBox {
        x: pbox.x,
        y: pbox.y,
        width: pbox.width,
        height: pbox.height,
        background_color,
        border,
        radius,
        text,
        image,
        marker,
        children: pbox
            .children
            .iter()
            .map(|c| build_canvas_box(c, fonts))
            .collect(),
    }
}
