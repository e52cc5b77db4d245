//! Pagination – splits one tall captured bitmap into page-sized bands.
//!
//! The bitmap is scaled so its width fills the page width minus the margin.
//! At that scale a page holds a fixed number of source rows (the capacity).
//! Bands are cut from the original bitmap at multiples of the capacity, so
//! consecutive bands tile it exactly: no gap, no overlap, the last band
//! carrying the remainder.

use image::imageops;

use crate::config::PageGeometry;
use crate::error::ExportError;
use crate::raster::Bitmap;

/// A horizontal band of source rows, `start..start + rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: u32,
    pub rows: u32,
}

impl Band {
    pub fn end(&self) -> u32 {
        self.start + self.rows
    }
}

/// How a bitmap maps onto output pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub bitmap_width: u32,
    pub bitmap_height: u32,
    /// Source pixels per inch once scaled to the target width.
    pub px_per_in: f32,
    /// Source rows one page can hold.
    pub capacity_rows: u32,
    pub bands: Vec<Band>,
    pub geometry: PageGeometry,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.bands.len()
    }

    pub fn is_single_page(&self) -> bool {
        self.bands.len() == 1
    }

    /// Placed width of every band, in inches.
    pub fn placed_width_in(&self) -> f32 {
        self.bitmap_width as f32 / self.px_per_in
    }

    /// Placed height of a band, in inches.
    pub fn placed_height_in(&self, band: &Band) -> f32 {
        band.rows as f32 / self.px_per_in
    }
}

/// Work out page count and band boundaries for a `width` × `height` bitmap.
pub fn plan_pages(width: u32, height: u32, geometry: PageGeometry) -> Result<PagePlan, ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::Capture(format!(
            "captured bitmap is empty ({width}x{height})"
        )));
    }
    let target_width_in = geometry.target_width_in();
    let usable_height_in = geometry.usable_height_in();
    if target_width_in <= 0.0 || usable_height_in <= 0.0 {
        return Err(ExportError::Pdf("page margin leaves no printable area".into()));
    }

    let px_per_in = width as f32 / target_width_in;
    let capacity_rows = ((usable_height_in * px_per_in).floor() as u32).max(1);

    let bands = if height <= capacity_rows {
        vec![Band {
            start: 0,
            rows: height,
        }]
    } else {
        tile_bands(height, capacity_rows)
    };
    log::debug!(
        "bitmap {width}x{height}: {} page(s), capacity {capacity_rows} rows",
        bands.len()
    );

    Ok(PagePlan {
        bitmap_width: width,
        bitmap_height: height,
        px_per_in,
        capacity_rows,
        bands,
        geometry,
    })
}

/// Cut `height` rows into `ceil(height / capacity)` consecutive bands.
pub fn tile_bands(height: u32, capacity: u32) -> Vec<Band> {
    let capacity = capacity.max(1);
    let pages = height.div_ceil(capacity);
    (0..pages)
        .map(|i| {
            let start = i * capacity;
            Band {
                start,
                rows: capacity.min(height - start),
            }
        })
        .collect()
}

/// Crop each band of the plan out of the original bitmap.
pub fn slice_bands(bitmap: &Bitmap, plan: &PagePlan) -> Vec<Bitmap> {
    plan.bands
        .iter()
        .map(|band| imageops::crop_imm(bitmap, 0, band.start, bitmap.width(), band.rows).to_image())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checkerboard(w: u32, h: u32) -> Bitmap {
        Bitmap::from_fn(w, h, |x, y| {
            if (x / 10 + y / 10) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn uneven_height_gets_a_remainder_band() {
        let bands = tile_bands(2500, 1000);
        let rows: Vec<u32> = bands.iter().map(|b| b.rows).collect();
        assert_eq!(rows, vec![1000, 1000, 500]);
    }

    #[test]
    fn bands_tile_without_gap_or_overlap() {
        for (h, c) in [(2500, 1000), (999, 1000), (1000, 1000), (1001, 1000), (7, 3)] {
            let bands = tile_bands(h, c);
            assert_eq!(bands.len() as u32, h.div_ceil(c), "h={h} c={c}");
            assert_eq!(bands[0].start, 0);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].end(), pair[1].start);
            }
            assert_eq!(bands.last().map(Band::end), Some(h));
        }
    }

    #[test]
    fn slices_reassemble_the_original() {
        let bmp = checkerboard(40, 2500);
        let plan = PagePlan {
            bitmap_width: 40,
            bitmap_height: 2500,
            px_per_in: 100.0,
            capacity_rows: 1000,
            bands: tile_bands(2500, 1000),
            geometry: PageGeometry::default(),
        };
        let slices = slice_bands(&bmp, &plan);
        assert_eq!(slices.len(), 3);

        let mut rebuilt = Bitmap::new(40, 2500);
        let mut y = 0;
        for slice in &slices {
            imageops::replace(&mut rebuilt, slice, 0, y);
            y += slice.height() as i64;
        }
        assert_eq!(y, 2500);
        assert_eq!(rebuilt, bmp);
    }

    #[test]
    fn letter_page_capacity() {
        // 1632 px over 8.3in -> ~196.6 px/in; 10.8in holds 2123 rows.
        let plan = plan_pages(1632, 2112, PageGeometry::default()).unwrap();
        assert!(plan.is_single_page());
        assert_eq!(plan.capacity_rows, 2123);
        assert!((plan.placed_width_in() - 8.3).abs() < 1e-3);

        let tall = plan_pages(1632, 5000, PageGeometry::default()).unwrap();
        assert_eq!(tall.page_count(), 3);
        assert!(tall.bands.iter().all(|b| tall.placed_height_in(b) <= 10.8 + 1e-3));
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        assert!(plan_pages(0, 10, PageGeometry::default()).is_err());
        assert!(plan_pages(10, 0, PageGeometry::default()).is_err());
    }
}
