//! Font loading and text measurement using `ttf-parser`.
//!
//! Without a loaded face every measurement falls back to an average-advance
//! heuristic so capture stays deterministic on machines with no fonts. When a
//! TrueType face is available its glyph advances drive measurement and its
//! outlines are painted by the rasterizer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::FontError;

/// Regular faces probed by [`FontManager::discover_system`], in order.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for the synthetic heuristic face.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn synthetic() -> Self {
        SYNTHETIC.clone()
    }

    /// Parse the face on demand; ttf-parser borrows the bytes.
    pub fn face(&self) -> Option<ttf_parser::Face<'_>> {
        if self.bytes.is_empty() {
            return None;
        }
        ttf_parser::Face::parse(&self.bytes, 0).ok()
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub bold: bool,
}

/// Manages loaded faces, keyed by weight.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
}

impl FontManager {
    /// A manager with only the heuristic face.
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(FontKey { bold: false }, FontData::synthetic());
        fonts.insert(FontKey { bold: true }, FontData::synthetic());
        Self { fonts }
    }

    /// Load a TTF/OTF face from bytes for one weight.
    pub fn load_font(&mut self, bold: bool, bytes: Vec<u8>) -> Result<(), FontError> {
        let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };
        self.fonts.insert(FontKey { bold }, data);
        Ok(())
    }

    /// Load a regular face from a file, using it for both weights unless a
    /// sibling `-Bold` face exists next to it.
    pub fn load_path(&mut self, path: &Path) -> Result<(), FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_font(false, bytes.clone())?;

        match bold_sibling(path).and_then(|p| std::fs::read(p).ok()) {
            Some(bold) => self.load_font(true, bold)?,
            None => self.load_font(true, bytes)?,
        }
        debug!("loaded font face from {}", path.display());
        Ok(())
    }

    /// Try the well-known system locations; keep the heuristic face if none
    /// can be loaded.
    pub fn discover_system() -> Self {
        let mut mgr = Self::new();
        for candidate in SYSTEM_FONT_PATHS {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match mgr.load_path(path) {
                Ok(()) => return mgr,
                Err(e) => warn!("skipping font {candidate}: {e}"),
            }
        }
        debug!("no system font found, using heuristic metrics");
        mgr
    }

    /// Get font data for a weight, falling back to regular.
    pub fn get(&self, bold: bool) -> &FontData {
        self.fonts
            .get(&FontKey { bold })
            .or_else(|| self.fonts.get(&FontKey { bold: false }))
            .unwrap_or(&SYNTHETIC)
    }

    /// Measure the width of a string at a given font size (in px).
    /// With real font bytes we sum glyph advances; otherwise we use an
    /// average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let data = self.get(bold);
        let Some(face) = data.face() else {
            // Bold is ~10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        };

        let scale = font_size / data.units_per_em;
        text.chars()
            .map(|ch| match face.glyph_index(ch) {
                Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                None => font_size * 0.5,
            })
            .sum()
    }

    /// Line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in px.
    pub fn ascender_px(&self, font_size: f32, bold: bool) -> f32 {
        let data = self.get(bold);
        data.ascender * font_size / data.units_per_em
    }

    /// True when at least the regular weight has real outlines.
    pub fn has_real_fonts(&self) -> bool {
        self.get(false).face().is_some()
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

static SYNTHETIC: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
};

fn bold_sibling(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    let bold_stem = match stem.strip_suffix("-Regular") {
        Some(base) => format!("{base}-Bold"),
        None => format!("{stem}-Bold"),
    };
    Some(path.with_file_name(format!("{bold_stem}.{ext}")))
}

/// Word-wrap text to fit within `max_width` pixels. Explicit newlines always
/// break; `max_width <= 0` disables wrapping.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }
        if max_width <= 0.0 {
            lines.push(words.join(" "));
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold);
            if w > max_width && !current_line.is_empty() {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        // 5 chars × 16 × 0.5 = 40
        assert!((mgr.measure_text_width("Hello", 16.0, false) - 40.0).abs() < 0.1);
        assert!((mgr.measure_text_width("Hello", 16.0, true) - 44.0).abs() < 0.1);
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
    }

    #[test]
    fn newlines_always_break() {
        let mgr = FontManager::default();
        let lines = wrap_text("Led team\nShipped v2", 14.0, false, 0.0, &mgr);
        assert_eq!(lines, vec!["Led team", "Shipped v2"]);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        assert!(mgr.load_font(false, vec![0, 1, 2, 3]).is_err());
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn bold_sibling_naming() {
        let p = Path::new("/fonts/LiberationSans-Regular.ttf");
        assert_eq!(
            bold_sibling(p),
            Some(PathBuf::from("/fonts/LiberationSans-Bold.ttf"))
        );
    }
}
