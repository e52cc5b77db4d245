//! Rasterizer – paints a [`CaptureLayout`] into an opaque RGB bitmap with
//! `tiny-skia`.
//!
//! Painting happens in CSS pixels under a uniform scale transform, so a
//! capture at scale 2 yields a bitmap twice the layout's pixel size.

use image::RgbImage;
use log::{debug, warn};
use tiny_skia::{
    Color, FillRule, IntSize, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::canvas::{CanvasBox, CaptureLayout, TextPaint};
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::layout::decode_data_uri;

/// The captured page bitmap.
pub type Bitmap = RgbImage;

/// Paint the layout at `scale` device pixels per CSS pixel over white.
pub fn rasterize(
    layout: &CaptureLayout,
    scale: f32,
    fonts: &FontManager,
) -> Result<Bitmap, ExportError> {
    let width = (layout.width * scale).ceil().max(1.0) as u32;
    let height = (layout.height * scale).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        ExportError::Capture(format!("cannot allocate a {width}x{height} surface"))
    })?;
    pixmap.fill(Color::WHITE);

    let mut painter = Painter {
        pixmap: &mut pixmap,
        transform: Transform::from_scale(scale, scale),
        fonts,
    };
    painter.paint_box(&layout.root)?;
    debug!("rasterized {width}x{height} bitmap");

    Ok(to_rgb(&pixmap))
}

/// Drop the alpha channel. The surface starts opaque white and every paint
/// is source-over, so premultiplied and straight colour agree.
fn to_rgb(pixmap: &Pixmap) -> Bitmap {
    let (w, h) = (pixmap.width(), pixmap.height());
    let data: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(w, h, data).unwrap_or_else(|| RgbImage::new(w, h))
}

struct Painter<'a> {
    pixmap: &'a mut Pixmap,
    transform: Transform,
    fonts: &'a FontManager,
}

impl Painter<'_> {
    fn paint_box(&mut self, b: &CanvasBox) -> Result<(), ExportError> {
        if let Some(bg) = b.background_color {
            if let Some(path) = box_path(b.x, b.y, b.width, b.height, b.radius) {
                self.pixmap.fill_path(
                    &path,
                    &solid(bg),
                    FillRule::Winding,
                    self.transform,
                    None,
                );
            }
        }

        if let Some(image) = &b.image {
            self.paint_image(b, &image.src)?;
        }

        if let Some(border) = &b.border {
            self.paint_border(b, border.widths, border.color);
        }

        if let Some(marker) = &b.marker {
            self.paint_text(marker);
        }
        if let Some(text) = &b.text {
            self.paint_text(text);
        }

        for child in &b.children {
            self.paint_box(child)?;
        }
        Ok(())
    }

    fn paint_border(&mut self, b: &CanvasBox, widths: [f32; 4], color: [u8; 4]) {
        let paint = solid(color);
        let [top, right, bottom, left] = widths;
        let uniform = top == right && right == bottom && bottom == left;

        if b.radius > 0.0 && uniform {
            let inset = top / 2.0;
            if let Some(path) = box_path(
                b.x + inset,
                b.y + inset,
                b.width - top,
                b.height - top,
                (b.radius - inset).max(0.0),
            ) {
                let stroke = Stroke {
                    width: top,
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, self.transform, None);
            }
            return;
        }

        let sides = [
            (b.x, b.y, b.width, top),
            (b.x + b.width - right, b.y, right, b.height),
            (b.x, b.y + b.height - bottom, b.width, bottom),
            (b.x, b.y, left, b.height),
        ];
        for (x, y, w, h) in sides {
            if w <= 0.0 || h <= 0.0 {
                continue;
            }
            if let Some(rect) = Rect::from_xywh(x, y, w, h) {
                self.pixmap.fill_rect(rect, &paint, self.transform, None);
            }
        }
    }

    fn paint_text(&mut self, text: &TextPaint) {
        let paint = solid(text.color);
        let data = self.fonts.get(text.bold);

        let Some(face) = data.face() else {
            // Greeked bars standing in for the glyph run.
            for line in &text.lines {
                let h = text.font_size * 0.5;
                let top = line.baseline - text.font_size * 0.6;
                if let Some(rect) = Rect::from_xywh(line.x, top, line.width.max(0.5), h) {
                    self.pixmap.fill_rect(rect, &paint, self.transform, None);
                }
            }
            return;
        };

        let scale = text.font_size / data.units_per_em;
        for line in &text.lines {
            let mut pen_x = line.x;
            let mut builder = GlyphPath {
                builder: PathBuilder::new(),
                origin_x: 0.0,
                baseline: line.baseline,
                scale,
            };
            for ch in line.text.chars() {
                let Some(gid) = face.glyph_index(ch) else {
                    pen_x += text.font_size * 0.5;
                    continue;
                };
                builder.origin_x = pen_x;
                face.outline_glyph(gid, &mut builder);
                pen_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
            }
            if let Some(path) = builder.builder.finish() {
                self.pixmap
                    .fill_path(&path, &paint, FillRule::Winding, self.transform, None);
            }
        }
    }

    fn paint_image(&mut self, b: &CanvasBox, src: &str) -> Result<(), ExportError> {
        let bytes = decode_data_uri(src)
            .ok_or_else(|| ExportError::Image(format!("unsupported image source: {}", preview(src))))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ExportError::Image(e.to_string()))?
            .to_rgba8();
        let (img_w, img_h) = decoded.dimensions();
        if img_w == 0 || img_h == 0 || b.width <= 0.0 || b.height <= 0.0 {
            warn!("skipping empty image");
            return Ok(());
        }

        // tiny-skia stores premultiplied RGBA.
        let mut data = decoded.into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        let size = IntSize::from_wh(img_w, img_h)
            .ok_or_else(|| ExportError::Image("image has no area".into()))?;
        let source = Pixmap::from_vec(data, size)
            .ok_or_else(|| ExportError::Image("image buffer size mismatch".into()))?;

        let mask = if b.radius > 0.0 {
            let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())
                .ok_or_else(|| ExportError::Capture("cannot allocate clip mask".into()))?;
            if let Some(path) = box_path(b.x, b.y, b.width, b.height, b.radius) {
                mask.fill_path(&path, FillRule::Winding, true, self.transform);
            }
            Some(mask)
        } else {
            None
        };

        let place = Transform::from_row(
            b.width / img_w as f32,
            0.0,
            0.0,
            b.height / img_h as f32,
            b.x,
            b.y,
        )
        .post_concat(self.transform);
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &PixmapPaint::default(), place, mask.as_ref());
        Ok(())
    }
}

fn solid(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn preview(src: &str) -> &str {
    match src.char_indices().nth(40) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

/// A rectangle, optionally with rounded corners.
fn box_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    let rect = Rect::from_xywh(x, y, w, h)?;
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }
    let r = r.min(w / 2.0).min(h / 2.0);
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Feeds font-unit glyph outlines into a CSS-pixel path, flipping y.
struct GlyphPath {
    builder: PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPath {
    fn pt(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphPath {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x, y) = self.pt(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x2, y2) = self.pt(x2, y2);
        let (x, y) = self.pt(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{el, ElementNode, Tag};
    use crate::layout::compute_layout;
    use crate::style::style_root;

    fn capture(root: ElementNode, scale: f32) -> Result<Bitmap, ExportError> {
        let fonts = FontManager::default();
        let styled = style_root(&root).unwrap();
        let laid = compute_layout(&styled, 816.0, &fonts)?;
        rasterize(&CaptureLayout::from_layout(&laid, &fonts), scale, &fonts)
    }

    #[test]
    fn scale_doubles_pixel_size() {
        let bmp = capture(el(Tag::Div).style("width", "100px").style("height", "50px"), 2.0).unwrap();
        assert_eq!(bmp.dimensions(), (200, 100));
        assert_eq!(bmp.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn inline_background_is_painted() {
        let bmp = capture(
            el(Tag::Div)
                .style("width", "40px")
                .style("height", "40px")
                .style("background-color", "rgb(37, 99, 235)"),
            1.0,
        )
        .unwrap();
        assert_eq!(bmp.get_pixel(20, 20).0, [37, 99, 235]);
    }

    #[test]
    fn symbolic_background_is_not_painted() {
        let bmp = capture(
            el(Tag::Div)
                .class("bg-blue-100")
                .style("width", "40px")
                .style("height", "40px"),
            1.0,
        )
        .unwrap();
        assert_eq!(bmp.get_pixel(20, 20).0, [255, 255, 255]);
    }

    #[test]
    fn undecodable_photo_fails_capture() {
        let root = el(Tag::Div).child(
            el(Tag::Img)
                .class("w-24 h-24")
                .attr("src", "data:image/png;base64,bm90IGFuIGltYWdl"),
        );
        assert!(matches!(capture(root, 1.0), Err(ExportError::Image(_))));
    }

    #[test]
    fn rounded_path_stays_in_bounds() {
        let path = box_path(0.0, 0.0, 10.0, 10.0, 50.0).unwrap();
        let bounds = path.bounds();
        assert!(bounds.right() <= 10.0 && bounds.bottom() <= 10.0);
    }
}
