//! Style resolver – maps inline declarations and utility classes to a flat
//! [`ComputedStyle`] struct consumed by the layout engine.
//!
//! Colour utility classes (`text-*`, `bg-*`, `border-<colour>`) are deliberately
//! not understood here. Colour reaches the capture backend only through
//! literal inline declarations, which the materializer writes.

use std::collections::BTreeMap;

use crate::dom::{DomNode, ElementNode, Tag};

/// CSS pixels per inch.
pub const PX_PER_IN: f32 = 96.0;
/// CSS pixels per point.
pub const PX_PER_PT: f32 = PX_PER_IN / 72.0;

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,

    // Spacing (px)
    pub margin: Edges,
    pub padding: Edges,

    // Border
    pub border: Edges,
    pub border_color: Color,
    pub border_radius: Radius,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub white_space: WhiteSpace,

    // Background
    pub background_color: Color,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_color: Color::BLACK,
            border_radius: Radius::None,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.5,
            white_space: WhiteSpace::Normal,
            background_color: Color::TRANSPARENT,
        }
    }
}

impl ComputedStyle {
    /// Reset the box-model properties that never inherit into text runs.
    pub fn as_text_run(&self) -> Self {
        Self {
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_radius: Radius::None,
            background_color: Color::TRANSPARENT,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    InlineBlock,
    ListItem,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Whitespace handling for text runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Collapse runs of whitespace, wrap at the box edge.
    Normal,
    /// Keep line breaks, collapse other whitespace, wrap.
    PreLine,
    /// Collapse whitespace, never wrap.
    NoWrap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    None,
    Px(f32),
    /// Fully rounded: a circle for square boxes, a pill otherwise.
    Full,
}

/// Per-side lengths in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let digit = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::from_rgb8(
                digit(&hex[0..2])?,
                digit(&hex[2..4])?,
                digit(&hex[4..6])?,
            )),
            3 => Some(Self::from_rgb8(
                digit(&hex[0..1].repeat(2))?,
                digit(&hex[1..2].repeat(2))?,
                digit(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse a CSS colour literal: `#rgb`, `#rrggbb`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)`, `white`, `black` or `transparent`.
    pub fn parse(val: &str) -> Option<Self> {
        let val = val.trim();
        if val.starts_with('#') {
            return Self::from_hex(val);
        }
        match val {
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            "transparent" => return Some(Self::TRANSPARENT),
            _ => {}
        }
        let inner = val
            .strip_prefix("rgba(")
            .or_else(|| val.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0) / 255.0);
        let a = match parts.get(3) {
            Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        Some(Self {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = base_style_for_tag(element.tag);

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight.max_with(style.font_weight);
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        style.white_space = p.white_space;
    }

    for class in element.classes() {
        apply_utility_class(&mut style, class);
    }

    for (prop, val) in element.style_declarations() {
        apply_css_property(&mut style, &prop, &val);
    }

    style
}

impl FontWeight {
    fn max_with(self, other: FontWeight) -> FontWeight {
        if self == FontWeight::Bold || other == FontWeight::Bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        }
    }
}

/// Defaults by tag, following a utility-first reset: block elements carry no
/// margins of their own.
fn base_style_for_tag(tag: Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::H1 | Tag::H2 | Tag::H3 => {
            s.font_weight = FontWeight::Bold;
        }
        Tag::Ul => {
            s.padding.left = 20.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
        }
        Tag::Span => {
            s.display = Display::Inline;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Div | Tag::P | Tag::Body => {}
    }
    s
}

/// Apply a single utility class.
fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display
        "flex" => s.display = Display::Flex,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" => s.display = Display::None,

        // Flex
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-nowrap" => s.flex_wrap = FlexWrap::NoWrap,
        "flex-grow" | "grow" => s.flex_grow = 1.0,
        "flex-shrink-0" | "shrink-0" => s.flex_shrink = 0.0,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }
        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        // Typography
        "font-bold" | "font-semibold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,
        "text-xs" => s.font_size = 12.0,
        "text-sm" => s.font_size = 14.0,
        "text-base" => s.font_size = 16.0,
        "text-lg" => s.font_size = 18.0,
        "text-xl" => s.font_size = 20.0,
        "text-2xl" => s.font_size = 24.0,
        "text-3xl" => s.font_size = 30.0,
        "text-4xl" => s.font_size = 36.0,
        "leading-tight" => s.line_height = 1.25,
        "leading-normal" => s.line_height = 1.5,
        "leading-relaxed" => s.line_height = 1.625,
        "whitespace-normal" => s.white_space = WhiteSpace::Normal,
        "whitespace-pre-line" => s.white_space = WhiteSpace::PreLine,
        "whitespace-nowrap" => s.white_space = WhiteSpace::NoWrap,

        // Width
        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(100.0 / 3.0),
        "w-2/3" => s.width = Dimension::Percent(200.0 / 3.0),
        "w-1/4" => s.width = Dimension::Percent(25.0),
        "w-3/4" => s.width = Dimension::Percent(75.0),

        // Borders
        "border" => s.border = Edges::all(1.0),
        "border-0" => s.border = Edges::ZERO,
        "border-t" => s.border.top = 1.0,
        "border-r" => s.border.right = 1.0,
        "border-b" => s.border.bottom = 1.0,
        "border-l" => s.border.left = 1.0,
        "rounded" => s.border_radius = Radius::Px(4.0),
        "rounded-md" => s.border_radius = Radius::Px(6.0),
        "rounded-lg" => s.border_radius = Radius::Px(8.0),
        "rounded-full" => s.border_radius = Radius::Full,
        "rounded-none" => s.border_radius = Radius::None,

        _ => {
            try_parse_spacing_class(s, class);
            try_parse_border_width_class(s, class);
            try_parse_gap_class(s, class);
            try_parse_size_class(s, class);
        }
    }
}

/// `p-{n}`, `px-{n}`, `mt-{n}` and friends; one unit is 4px.
fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    let Some((prefix, value_str)) = class.rsplit_once('-') else {
        return;
    };
    let value = match value_str.parse::<f32>() {
        Ok(v) => v * 4.0,
        Err(_) => return,
    };
    let (target, sides) = match prefix.split_at_checked(1) {
        Some(("p", rest)) => (&mut s.padding, rest),
        Some(("m", rest)) => (&mut s.margin, rest),
        _ => return,
    };
    match sides {
        "" => *target = Edges::all(value),
        "x" => {
            target.left = value;
            target.right = value;
        }
        "y" => {
            target.top = value;
            target.bottom = value;
        }
        "t" => target.top = value,
        "r" => target.right = value,
        "b" => target.bottom = value,
        "l" => target.left = value,
        _ => {}
    }
}

/// `border-2`, `border-b-2`, `border-l-4`.
fn try_parse_border_width_class(s: &mut ComputedStyle, class: &str) {
    let Some(rest) = class.strip_prefix("border-") else {
        return;
    };
    let (side, width) = match rest.split_once('-') {
        Some((side, w)) => (side, w),
        None => ("", rest),
    };
    let Ok(width) = width.parse::<f32>() else {
        return;
    };
    match side {
        "" => s.border = Edges::all(width),
        "t" => s.border.top = width,
        "r" => s.border.right = width,
        "b" => s.border.bottom = width,
        "l" => s.border.left = width,
        _ => {}
    }
}

fn try_parse_gap_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("gap-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.gap = v * 4.0;
        }
    }
}

fn try_parse_size_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("w-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.width = Dimension::Px(v * 4.0);
        }
    } else if let Some(rest) = class.strip_prefix("h-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.height = Dimension::Px(v * 4.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Inline declarations
// ---------------------------------------------------------------------------

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "font-size" => {
            if let Some(px) = parse_length(val) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "border-width" => {
            if let Some(px) = parse_length(val) {
                s.border = Edges::all(px);
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "white-space" => {
            s.white_space = match val {
                "pre-line" | "pre-wrap" => WhiteSpace::PreLine,
                "nowrap" => WhiteSpace::NoWrap,
                _ => WhiteSpace::Normal,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "min-height" => s.min_height = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "margin" => apply_shorthand_spacing(val, &mut s.margin),
        "margin-top" => set_length(val, &mut s.margin.top),
        "margin-right" => set_length(val, &mut s.margin.right),
        "margin-bottom" => set_length(val, &mut s.margin.bottom),
        "margin-left" => set_length(val, &mut s.margin.left),
        "padding" => apply_shorthand_spacing(val, &mut s.padding),
        "padding-top" => set_length(val, &mut s.padding.top),
        "padding-right" => set_length(val, &mut s.padding.right),
        "padding-bottom" => set_length(val, &mut s.padding.bottom),
        "padding-left" => set_length(val, &mut s.padding.left),
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_length(val) {
                s.line_height = px / s.font_size;
            }
        }
        "gap" => set_length(val, &mut s.gap),
        _ => {}
    }
}

fn set_length(val: &str, target: &mut f32) {
    if let Some(px) = parse_length(val) {
        *target = px;
    }
}

/// Parse a length in `px`, `in` or `pt` (unitless is px) into CSS pixels.
pub fn parse_length(s: &str) -> Option<f32> {
    let s = s.trim();
    let (num, factor) = if let Some(n) = s.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix("in") {
        (n, PX_PER_IN)
    } else if let Some(n) = s.strip_suffix("pt") {
        (n, PX_PER_PT)
    } else {
        (s, 1.0)
    };
    num.trim().parse::<f32>().ok().map(|v| v * factor)
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(val: &str, target: &mut Edges) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_length).collect();
    match parts.as_slice() {
        [v] => *target = Edges::all(*v),
        [v, h] => {
            *target = Edges {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }
        }
        [t, r, b, l] => {
            *target = Edges {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Styled tree
// ---------------------------------------------------------------------------

/// A visual-tree node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (image `src` and so on).
        attrs: BTreeMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from visual-tree nodes, resolving styles top-down.
/// Elements resolving to `display: none` are dropped along with their subtree.
pub fn build_styled_tree(nodes: &[DomNode], parent_style: Option<&ComputedStyle>) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style));
                result.push(StyledNode::Element {
                    tag: e.tag,
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if !text.trim().is_empty() {
                    let style = parent_style.cloned().unwrap_or_default().as_text_run();
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}

/// Style the single root element of a subtree.
pub fn style_root(root: &ElementNode) -> Option<StyledNode> {
    build_styled_tree(std::slice::from_ref(&DomNode::Element(root.clone())), None)
        .into_iter()
        .next()
}
