//! Capture pipeline – ties together styling, layout, freezing and painting
//! to turn a materialized print clone into a bitmap.

use crate::canvas::CaptureLayout;
use crate::config::ExportConfig;
use crate::dom::ElementNode;
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::raster::{rasterize, Bitmap};
use crate::style::{style_root, PX_PER_IN};

/// Clone the print target and force it into a capturable state: visible,
/// fixed page width, white background and full-page padding. Inline
/// declarations win over the target's `hidden` class.
pub fn prepare_clone(target: &ElementNode, config: &ExportConfig) -> ElementNode {
    let mut clone = target.clone();
    clone.set_style("display", "block");
    clone.set_style("visibility", "visible");
    clone.set_style("width", &format!("{}in", config.print_width_in));
    clone.set_style("padding", &format!("{}in", config.print_padding_in));
    clone.set_style("background-color", "#ffffff");
    clone
}

/// Style and lay out a prepared clone and freeze the result.
pub fn capture_layout(
    clone: &ElementNode,
    config: &ExportConfig,
    fonts: &FontManager,
) -> Result<CaptureLayout, ExportError> {
    let styled = style_root(clone).ok_or_else(|| {
        ExportError::Capture("print clone resolved to display: none".into())
    })?;
    let viewport = config.print_width_in * PX_PER_IN;
    let laid_out = compute_layout(&styled, viewport, fonts)?;
    Ok(CaptureLayout::from_layout(&laid_out, fonts))
}

/// Full capture: layout then rasterize at the configured scale.
pub fn capture_bitmap(
    clone: &ElementNode,
    config: &ExportConfig,
    fonts: &FontManager,
) -> Result<Bitmap, ExportError> {
    let layout = capture_layout(clone, config, fonts)?;
    log::debug!(
        "capture surface {}x{} css px at scale {}",
        layout.width,
        layout.height,
        config.capture_scale
    );
    rasterize(&layout, config.capture_scale, fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResumeDocument;
    use crate::templates::{render, Surface};

    #[test]
    fn clone_is_forced_visible_and_sized() {
        let target = render(&ResumeDocument::default(), 1, Surface::Print);
        let clone = prepare_clone(&target, &ExportConfig::default());

        assert!(clone.has_class("hidden"));
        let decls = clone.style_declarations();
        let get = |p: &str| decls.iter().find(|(k, _)| k == p).map(|(_, v)| v.as_str());
        assert_eq!(get("display"), Some("block"));
        assert_eq!(get("width"), Some("8.5in"));
        assert_eq!(get("padding"), Some("1in"));
        assert_eq!(get("background-color"), Some("#ffffff"));
        // The target itself stays hidden.
        assert!(style_root(&target).is_none());
    }

    #[test]
    fn letter_capture_is_at_least_one_page_tall() {
        let target = render(&ResumeDocument::default(), 1, Surface::Print);
        let config = ExportConfig::default();
        let fonts = FontManager::default();
        let clone = prepare_clone(&target, &config);

        let layout = capture_layout(&clone, &config, &fonts).unwrap();
        assert_eq!(layout.width, 816.0);
        assert!(layout.height >= 1056.0);

        let bmp = capture_bitmap(&clone, &config, &fonts).unwrap();
        assert_eq!(bmp.width(), 1632);
        assert!(bmp.height() >= 2112);
    }
}
