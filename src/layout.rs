//! Layout engine – uses Taffy to compute flexbox layout from a styled tree,
//! then converts the result into a tree of absolutely positioned boxes.
//!
//! Coordinates are CSS pixels with the origin at the top-left of the root.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::ExportError;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, FontWeight, StyledNode, TextAlign, WhiteSpace};

/// A positioned box in capture coordinates.
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxContent {
    None,
    Text { lines: Vec<LineRun> },
    Image { src: String },
    /// List item marker drawn in the parent's left gutter.
    ListItem { marker: String },
}

/// One wrapped line with its measured advance.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRun {
    pub text: String,
    pub width: f32,
}

fn taffy_err(e: taffy::TaffyError) -> ExportError {
    ExportError::Layout(format!("{e:?}"))
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    /// Collect all text content from an inline subtree (spans, text nodes).
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::collect_inline_text).collect()
            }
        }
    }

    /// True when every child is a text node or an inline element.
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == style::Display::Inline && Self::all_inline(gc),
        })
    }

    fn build_node(
        &mut self,
        styled: &StyledNode,
        parent_width: f32,
        in_column: bool,
    ) -> Result<NodeId, ExportError> {
        match styled {
            StyledNode::Text { text, style } => {
                self.build_text_node(text, style, parent_width, in_column)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => {
                let src = attrs.get("src").map(String::as_str).unwrap_or("");
                self.build_element_node(*tag, style, children, src, parent_width)
            }
        }
    }

    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        max_width: f32,
        in_column: bool,
    ) -> Result<NodeId, ExportError> {
        let bold = style.font_weight == FontWeight::Bold;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let normalised = normalise_whitespace(text, style.white_space);
        let wrap_at = match style.white_space {
            WhiteSpace::NoWrap => 0.0,
            _ => max_width,
        };
        let lines: Vec<LineRun> = wrap_text(&normalised, font_size, bold, wrap_at, self.fonts)
            .into_iter()
            .map(|text| LineRun {
                width: self.fonts.measure_text_width(&text, font_size, bold),
                text,
            })
            .collect();

        let text_width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        // In a column the text box hugs its lines and aligns itself, which is
        // how text-align reaches the box without a full inline formatting pass.
        let align_self = if in_column {
            Some(match style.text_align {
                TextAlign::Left => taffy::AlignSelf::Start,
                TextAlign::Center => taffy::AlignSelf::Center,
                TextAlign::Right => taffy::AlignSelf::End,
            })
        } else {
            None
        };

        let taffy_style = Style {
            size: Size {
                width: Dimension::Length(text_width),
                height: Dimension::Length(text_height),
            },
            flex_shrink: 0.0,
            align_self,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        src: &str,
        parent_width: f32,
    ) -> Result<NodeId, ExportError> {
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width,
        };
        let inner_width = (my_width - style.padding.horizontal() - style.border.horizontal()).max(0.0);

        // Paragraph-like blocks whose children are all inline flow as one
        // wrapped run inside a box carrying the block's own style.
        if tag.is_paragraph() && !children.is_empty() && Self::all_inline(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            let leaf = self.build_text_node(&raw, &style.as_text_run(), inner_width, true)?;
            return self.finish_element(tag, style, &[leaf], src, parent_width);
        }

        let is_flex_row =
            style.display == style::Display::Flex && style.flex_direction == style::FlexDirection::Row;
        let is_inline = style.display == style::Display::Inline;

        let mut child_nodes = Vec::new();
        let widths = if is_flex_row {
            flex_row_slots(children, inner_width, style.gap)
        } else {
            vec![inner_width; children.len()]
        };

        for (child, slot) in children.iter().zip(widths) {
            let child_id = self.build_node(child, slot, !is_flex_row && !is_inline)?;
            if let StyledNode::Element { tag: Tag::Li, .. } = child {
                self.node_content.insert(
                    child_id,
                    BoxContent::ListItem {
                        marker: "\u{2022}".to_string(),
                    },
                );
            }
            child_nodes.push(child_id);
        }

        self.finish_element(tag, style, &child_nodes, src, parent_width)
    }

    fn finish_element(
        &mut self,
        tag: Tag,
        style: &ComputedStyle,
        child_nodes: &[NodeId],
        src: &str,
        parent_width: f32,
    ) -> Result<NodeId, ExportError> {
        // An <img> with an auto side takes it from the decoded intrinsic size,
        // otherwise an empty flex box collapses to nothing.
        let style_override = if tag == Tag::Img {
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };
        let effective_style = style_override.as_ref().unwrap_or(style);

        let taffy_style = computed_to_taffy(effective_style);
        let node = self
            .taffy
            .new_with_children(taffy_style, child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, effective_style.clone());

        if tag == Tag::Img {
            self.node_content.insert(
                node,
                BoxContent::Image {
                    src: src.to_string(),
                },
            );
        }
        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, ExportError> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(taffy_err)?
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

/// Estimate each child's width in a flex row so text wraps to its column at
/// build time: fixed and percentage widths first, the rest split evenly.
fn flex_row_slots(children: &[StyledNode], inner_width: f32, gap: f32) -> Vec<f32> {
    let elements = children
        .iter()
        .filter(|c| matches!(c, StyledNode::Element { .. }))
        .count();
    let gap_total = gap * elements.saturating_sub(1) as f32;
    let track = (inner_width - gap_total).max(1.0);

    let mut claimed = 0.0;
    let mut auto_count = 0usize;
    for child in children {
        if let StyledNode::Element { style, .. } = child {
            match style.width {
                style::Dimension::Px(w) => claimed += w,
                style::Dimension::Percent(p) => claimed += track * p / 100.0,
                style::Dimension::Auto => auto_count += 1,
            }
        }
    }
    let auto_width = ((track - claimed) / auto_count.max(1) as f32).max(1.0);

    children
        .iter()
        .map(|child| match child {
            // Percentages resolve against the parent inside the child itself.
            StyledNode::Element { style, .. } => match style.width {
                style::Dimension::Auto => auto_width,
                _ => track,
            },
            StyledNode::Text { .. } => inner_width,
        })
        .collect()
}

fn normalise_whitespace(text: &str, mode: WhiteSpace) -> String {
    match mode {
        WhiteSpace::PreLine => text
            .trim()
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n"),
        WhiteSpace::Normal | WhiteSpace::NoWrap => {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        }
    }
}

fn computed_to_taffy(s: &ComputedStyle) -> Style {
    let mut ts = Style::default();

    match s.display {
        style::Display::Flex => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match s.flex_direction {
                style::FlexDirection::Row => taffy::FlexDirection::Row,
                style::FlexDirection::Column => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::Start,
                style::JustifyContent::End => taffy::JustifyContent::End,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
            });
            ts.align_items = Some(match s.align_items {
                style::AlignItems::Start => taffy::AlignItems::Start,
                style::AlignItems::End => taffy::AlignItems::End,
                style::AlignItems::Center => taffy::AlignItems::Center,
                style::AlignItems::Stretch => taffy::AlignItems::Stretch,
            });
        }
        style::Display::Block | style::Display::ListItem | style::Display::InlineBlock => {
            // Block-level elements stack vertically.
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Inline => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    ts.min_size = Size {
        width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            Dimension::Length(0.0)
        } else {
            Dimension::Auto
        },
        height: dim_to_taffy(s.min_height),
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: Dimension::Auto,
    };

    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = if s.white_space == WhiteSpace::NoWrap {
        0.0
    } else {
        s.flex_shrink
    };

    ts.margin = Rect {
        top: LengthPercentageAuto::Length(s.margin.top),
        right: LengthPercentageAuto::Length(s.margin.right),
        bottom: LengthPercentageAuto::Length(s.margin.bottom),
        left: LengthPercentageAuto::Length(s.margin.left),
    };
    ts.padding = Rect {
        top: LengthPercentage::Length(s.padding.top),
        right: LengthPercentage::Length(s.padding.right),
        bottom: LengthPercentage::Length(s.padding.bottom),
        left: LengthPercentage::Length(s.padding.left),
    };
    ts.border = Rect {
        top: LengthPercentage::Length(s.border.top),
        right: LengthPercentage::Length(s.border.right),
        bottom: LengthPercentage::Length(s.border.bottom),
        left: LengthPercentage::Length(s.border.left),
    };
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };

    ts
}

fn dim_to_taffy(d: style::Dimension) -> Dimension {
    match d {
        style::Dimension::Auto => Dimension::Auto,
        style::Dimension::Px(v) => Dimension::Length(v),
        style::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(src: &str) -> Option<Vec<u8>> {
    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let (_, b64) = src.split_once(',')?;
    BASE64_STD.decode(b64.trim()).ok()
}

/// Replace `Auto` image sides with values derived from the intrinsic size.
/// Returns `None` when nothing needs fixing or the source cannot be decoded.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };
    if known_w.is_some() && known_h.is_some() {
        return None;
    }

    let bytes = decode_data_uri(src)?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            s.width = style::Dimension::Px(px_w);
            s.height = style::Dimension::Px(px_h);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled subtree root. The root keeps its own width
/// when it declares one; otherwise it fills `viewport_width`.
pub fn compute_layout(
    root: &StyledNode,
    viewport_width: f32,
    fonts: &FontManager,
) -> Result<PositionedBox, ExportError> {
    let mut builder = LayoutBuilder::new(fonts);
    let root_id = builder.build_node(root, viewport_width, true)?;

    builder
        .taffy
        .compute_layout(
            root_id,
            Size {
                width: AvailableSpace::Definite(viewport_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    builder.extract(root_id, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::el;
    use crate::style::style_root;

    fn lay_out(root: crate::dom::ElementNode, width: f32) -> PositionedBox {
        let styled = style_root(&root).expect("visible root");
        compute_layout(&styled, width, &FontManager::default()).unwrap()
    }

    fn first_text(b: &PositionedBox) -> Option<&PositionedBox> {
        if matches!(b.content, BoxContent::Text { .. }) {
            return Some(b);
        }
        b.children.iter().find_map(first_text)
    }

    #[test]
    fn root_keeps_declared_physical_width() {
        let root = el(Tag::Div)
            .style("width", "8.5in")
            .style("padding", "1in")
            .child(el(Tag::P).text("Hello world"));
        let b = lay_out(root, 1200.0);
        assert!((b.width - 816.0).abs() < 0.5);
        let text = first_text(&b).unwrap();
        assert!((text.x - 96.0).abs() < 0.5);
        assert!((text.y - 96.0).abs() < 0.5);
    }

    #[test]
    fn min_height_extends_short_content() {
        let root = el(Tag::Div).style("min-height", "11in").text("short");
        let b = lay_out(root, 816.0);
        assert!((b.height - 1056.0).abs() < 0.5);
    }

    #[test]
    fn paragraph_wraps_to_container() {
        let long = "word ".repeat(60);
        let root = el(Tag::Div).style("width", "200px").child(el(Tag::P).text(long.as_str()));
        let b = lay_out(root, 816.0);
        match &first_text(&b).unwrap().content {
            BoxContent::Text { lines } => {
                assert!(lines.len() > 5);
                assert!(lines.iter().all(|l| l.width <= 200.0));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn pre_line_keeps_breaks() {
        let root = el(Tag::P).class("whitespace-pre-line").text("one\ntwo\nthree");
        let b = lay_out(root, 816.0);
        match &first_text(&b).unwrap().content {
            BoxContent::Text { lines } => assert_eq!(lines.len(), 3),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn flex_row_places_children_side_by_side() {
        let root = el(Tag::Div)
            .class("flex justify-between")
            .style("width", "400px")
            .child(el(Tag::Span).text("Left"))
            .child(el(Tag::Span).text("Right"));
        let b = lay_out(root, 816.0);
        assert_eq!(b.children.len(), 2);
        assert!(b.children[0].x < b.children[1].x);
        assert!((b.children[1].x + b.children[1].width - 400.0).abs() < 0.5);
    }

    #[test]
    fn percent_columns_share_the_row() {
        let root = el(Tag::Div)
            .class("flex")
            .style("width", "600px")
            .child(el(Tag::Div).class("w-1/3").text("a"))
            .child(el(Tag::Div).class("w-2/3").text("b"));
        let b = lay_out(root, 816.0);
        assert!((b.children[0].width - 200.0).abs() < 1.0);
        assert!((b.children[1].width - 400.0).abs() < 1.0);
    }

    #[test]
    fn data_uri_decoding() {
        assert_eq!(decode_data_uri("data:image/png;base64,AAEC"), Some(vec![0, 1, 2]));
        assert_eq!(decode_data_uri("https://example.com/a.png"), None);
    }
}
