//! PDF assembly – places each bitmap band on its own page using `printpdf`
//! (v0.8 ops-based API).

use std::io::Cursor;

use ::image::{DynamicImage, ImageFormat};
use printpdf::*;

use crate::config::PT_PER_IN;
use crate::error::ExportError;
use crate::pagination::PagePlan;
use crate::raster::Bitmap;

const MM_PER_PT: f32 = 0.352778;

/// Build a document with one page per band of `plan`.
///
/// `slices` must be the output of [`crate::pagination::slice_bands`] for
/// the same plan. Every band sits at the page offset, scaled to the target
/// width; only the last band may be shorter than a full page.
pub fn assemble(slices: &[Bitmap], plan: &PagePlan, title: &str) -> Result<Vec<u8>, ExportError> {
    if slices.len() != plan.bands.len() {
        return Err(ExportError::Pdf(format!(
            "{} slices for {} planned pages",
            slices.len(),
            plan.bands.len()
        )));
    }

    let geometry = plan.geometry;
    let page_w = Mm(geometry.width_pt() * MM_PER_PT);
    let page_h = Mm(geometry.height_pt() * MM_PER_PT);
    let offset_pt = geometry.offset_in * PT_PER_IN;
    let width_pt = plan.placed_width_in() * PT_PER_IN;

    let mut doc = PdfDocument::new(title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pages = Vec::with_capacity(slices.len());

    for (slice, band) in slices.iter().zip(&plan.bands) {
        let png = encode_png(slice)?;
        let raw = RawImage::decode_from_bytes(&png, &mut warnings)
            .map_err(|e| ExportError::Pdf(format!("embedding page image: {e}")))?;
        let xobj_id = doc.add_image(&raw);

        let height_pt = plan.placed_height_in(band) * PT_PER_IN;
        // PDF origin is bottom-left; the band hangs from the top offset.
        let bottom_y = geometry.height_pt() - offset_pt - height_pt;

        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        let ops = vec![Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(offset_pt)),
                translate_y: Some(Pt(bottom_y)),
                dpi: Some(72.0),
                scale_x: Some(width_pt / slice.width() as f32),
                scale_y: Some(height_pt / slice.height() as f32),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    for w in &warnings {
        log::debug!("pdf: {w:?}");
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

fn encode_png(slice: &Bitmap) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(slice.clone())
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ExportError::Image(format!("encoding page image: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageGeometry;
    use crate::pagination::{plan_pages, slice_bands};

    #[test]
    fn three_band_document() {
        let bmp = Bitmap::from_pixel(166, 500, ::image::Rgb([200, 10, 10]));
        // 166 px over 8.3in is about 20 px/in, so a page holds about 216 rows.
        let plan = plan_pages(166, 500, PageGeometry::default()).unwrap();
        assert_eq!(plan.page_count(), 3);

        let slices = slice_bands(&bmp, &plan);
        let bytes = assemble(&slices, &plan, "Test").unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn mismatched_slices_are_rejected() {
        let plan = plan_pages(10, 10, PageGeometry::default()).unwrap();
        let err = assemble(&[], &plan, "Test").unwrap_err();
        assert!(matches!(err, ExportError::Pdf(_)));
    }
}
