//! Colour resolution – accent colour schemes and the literal colour table.
//!
//! Templates refer to colours only through symbolic utility tokens such as
//! `border-purple-300` or `text-slate-900`. The table here is the single place
//! those tokens become concrete RGB values.

use std::fmt;

/// The three accent tokens a template draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub border: &'static str,
    pub text: &'static str,
    pub bg_light: &'static str,
}

const SCHEMES: &[(&str, ColorScheme)] = &[
    ("purple", scheme("border-purple-300", "text-purple-600", "bg-purple-50")),
    ("blue", scheme("border-blue-300", "text-blue-600", "bg-blue-50")),
    ("indigo", scheme("border-indigo-300", "text-indigo-600", "bg-indigo-50")),
    ("orange", scheme("border-orange-300", "text-orange-600", "bg-orange-50")),
    ("amber", scheme("border-amber-300", "text-amber-600", "bg-amber-50")),
    ("cyan", scheme("border-cyan-300", "text-cyan-600", "bg-cyan-50")),
    ("gray", scheme("border-gray-300", "text-gray-600", "bg-gray-50")),
    ("rose", scheme("border-rose-300", "text-rose-600", "bg-rose-50")),
    ("violet", scheme("border-violet-300", "text-violet-600", "bg-violet-50")),
    ("stone", scheme("border-stone-300", "text-stone-600", "bg-stone-50")),
];

const fn scheme(border: &'static str, text: &'static str, bg_light: &'static str) -> ColorScheme {
    ColorScheme {
        border,
        text,
        bg_light,
    }
}

/// Accent used when a template names a colour we do not know.
pub const DEFAULT_ACCENT: &str = "blue";

/// Resolve an accent colour name to its scheme. Unknown names fall back to
/// the blue scheme.
pub fn scheme_for(accent: &str) -> ColorScheme {
    SCHEMES
        .iter()
        .find(|(name, _)| *name == accent)
        .or_else(|| SCHEMES.iter().find(|(name, _)| *name == DEFAULT_ACCENT))
        .map(|(_, s)| *s)
        .unwrap_or(SCHEMES[1].1)
}

/// Every accent name with a defined scheme.
pub fn known_accents() -> impl Iterator<Item = &'static str> {
    SCHEMES.iter().map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// Literal colour table
// ---------------------------------------------------------------------------

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Which style property a colour token drives, chosen by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorProperty {
    Background,
    Border,
    Text,
}

impl ColorProperty {
    pub fn of_token(token: &str) -> Self {
        if token.starts_with("bg-") {
            ColorProperty::Background
        } else if token.starts_with("border-") {
            ColorProperty::Border
        } else {
            ColorProperty::Text
        }
    }

    /// The inline CSS property name written for this kind of token.
    pub fn css_name(self) -> &'static str {
        match self {
            ColorProperty::Background => "background-color",
            ColorProperty::Border => "border-color",
            ColorProperty::Text => "color",
        }
    }
}

const LITERALS: &[(&str, Rgb)] = &[
    // Accent borders
    ("border-purple-300", Rgb(216, 180, 254)),
    ("border-blue-300", Rgb(147, 197, 253)),
    ("border-indigo-300", Rgb(165, 180, 252)),
    ("border-orange-300", Rgb(253, 186, 116)),
    ("border-amber-300", Rgb(252, 191, 73)),
    ("border-cyan-300", Rgb(165, 243, 252)),
    ("border-gray-300", Rgb(209, 213, 219)),
    ("border-rose-300", Rgb(253, 164, 175)),
    ("border-violet-300", Rgb(196, 181, 253)),
    ("border-stone-300", Rgb(214, 211, 209)),
    ("border-slate-200", Rgb(226, 232, 240)),
    // Accent headings
    ("text-purple-600", Rgb(147, 51, 234)),
    ("text-blue-600", Rgb(37, 99, 235)),
    ("text-indigo-600", Rgb(79, 70, 229)),
    ("text-orange-600", Rgb(234, 88, 12)),
    ("text-amber-600", Rgb(217, 119, 6)),
    ("text-cyan-600", Rgb(8, 145, 178)),
    ("text-gray-600", Rgb(75, 85, 99)),
    ("text-rose-600", Rgb(225, 29, 72)),
    ("text-violet-600", Rgb(124, 58, 237)),
    ("text-stone-600", Rgb(87, 83, 78)),
    // Badge backgrounds
    ("bg-purple-100", Rgb(245, 240, 255)),
    ("bg-blue-100", Rgb(239, 246, 255)),
    ("bg-indigo-100", Rgb(238, 242, 255)),
    ("bg-orange-100", Rgb(255, 237, 213)),
    ("bg-amber-100", Rgb(254, 243, 199)),
    ("bg-cyan-100", Rgb(207, 250, 254)),
    ("bg-gray-100", Rgb(243, 244, 246)),
    ("bg-rose-100", Rgb(255, 228, 230)),
    ("bg-violet-100", Rgb(237, 233, 254)),
    ("bg-stone-100", Rgb(245, 245, 244)),
    // Badge text
    ("text-purple-700", Rgb(126, 34, 206)),
    ("text-blue-700", Rgb(29, 78, 216)),
    ("text-indigo-700", Rgb(67, 56, 202)),
    ("text-orange-700", Rgb(194, 65, 12)),
    ("text-amber-700", Rgb(180, 83, 9)),
    ("text-cyan-700", Rgb(14, 116, 144)),
    ("text-gray-700", Rgb(55, 65, 81)),
    ("text-rose-700", Rgb(190, 18, 60)),
    ("text-violet-700", Rgb(109, 40, 217)),
    ("text-stone-700", Rgb(68, 64, 60)),
    // Light panels
    ("bg-purple-50", Rgb(250, 245, 255)),
    ("bg-blue-50", Rgb(239, 246, 255)),
    ("bg-indigo-50", Rgb(238, 242, 255)),
    ("bg-orange-50", Rgb(255, 247, 237)),
    ("bg-amber-50", Rgb(255, 251, 235)),
    ("bg-cyan-50", Rgb(236, 254, 255)),
    ("bg-gray-50", Rgb(249, 250, 251)),
    ("bg-rose-50", Rgb(255, 241, 242)),
    ("bg-violet-50", Rgb(245, 243, 255)),
    ("bg-stone-50", Rgb(250, 250, 249)),
    // Neutrals
    ("bg-white", Rgb(255, 255, 255)),
    ("text-white", Rgb(255, 255, 255)),
    ("text-slate-900", Rgb(15, 23, 42)),
    ("text-slate-700", Rgb(51, 65, 85)),
    ("text-slate-600", Rgb(71, 85, 105)),
    ("text-slate-500", Rgb(100, 116, 139)),
    ("text-slate-400", Rgb(148, 163, 184)),
];

/// Look up the literal colour for a symbolic token. Tokens outside the table
/// stay unresolved.
pub fn literal_for(token: &str) -> Option<Rgb> {
    LITERALS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, rgb)| *rgb)
}
