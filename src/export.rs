//! Export – locates the print target in the live page, captures a
//! materialized clone and assembles the paginated PDF.

use log::{debug, info, warn};

use crate::config::ExportConfig;
use crate::dom::Document;
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::materialize::materialize;
use crate::pagination::{plan_pages, slice_bands};
use crate::pdf::assemble;
use crate::pipeline::{capture_bitmap, prepare_clone};

pub const DEFAULT_FILENAME: &str = "Resume.pdf";
const FILENAME_SUFFIX: &str = "_Resume.pdf";

/// A finished document, not yet saved.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub filename: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// Runs the capture and pagination stages for one live page at a time.
pub struct Exporter {
    config: ExportConfig,
    fonts: FontManager,
}

impl Exporter {
    /// Load fonts as configured: the explicit face when set, otherwise the
    /// first system face found, otherwise heuristic metrics.
    pub fn new(config: ExportConfig) -> Self {
        let fonts = match &config.font_path {
            Some(path) => {
                let mut fonts = FontManager::new();
                if let Err(e) = fonts.load_path(path) {
                    warn!("{e}; falling back to heuristic metrics");
                }
                fonts
            }
            None => FontManager::discover_system(),
        };
        Self::with_fonts(config, fonts)
    }

    pub fn with_fonts(config: ExportConfig, fonts: FontManager) -> Self {
        Self { config, fonts }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    /// Export the print target of `live` under a filename derived from
    /// `base_name`. `live` is only read; all mutation happens on a clone.
    pub async fn export(&self, live: &Document, base_name: &str) -> Result<ExportReport, ExportError> {
        let target = live
            .find_by_id(&self.config.print_target_id)
            .ok_or_else(|| ExportError::TargetNotFound(self.config.print_target_id.clone()))?;

        let mut clone = prepare_clone(target, &self.config);
        materialize(&mut clone);

        if !self.config.settle_delay.is_zero() {
            debug!("waiting {:?} for images to settle", self.config.settle_delay);
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let bitmap = capture_bitmap(&clone, &self.config, &self.fonts)?;
        drop(clone);

        let plan = plan_pages(bitmap.width(), bitmap.height(), self.config.page)?;
        let slices = slice_bands(&bitmap, &plan);
        let filename = derive_filename(base_name);
        let title = filename.trim_end_matches(".pdf").replace('_', " ");
        let bytes = assemble(&slices, &plan, &title)?;

        info!(
            "exported {filename}: {} page(s), {} bytes",
            plan.page_count(),
            bytes.len()
        );
        Ok(ExportReport {
            filename,
            page_count: plan.page_count(),
            bytes,
        })
    }
}

/// `Jane Q. Public` becomes `Jane_Q._Public_Resume.pdf`; a blank name gives
/// [`DEFAULT_FILENAME`].
pub fn derive_filename(full_name: &str) -> String {
    let words: Vec<&str> = full_name.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }
    format!("{}{FILENAME_SUFFIX}", words.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::model::ResumeDocument;
    use crate::templates::{render_page, SCREEN_PREVIEW_ID};

    fn exporter() -> Exporter {
        Exporter::with_fonts(ExportConfig::default(), FontManager::new())
    }

    #[test]
    fn filenames() {
        assert_eq!(derive_filename("Jane Q. Public"), "Jane_Q._Public_Resume.pdf");
        assert_eq!(derive_filename("Alex   Kim"), "Alex_Kim_Resume.pdf");
        assert_eq!(derive_filename("Alex\tKim\n"), "Alex_Kim_Resume.pdf");
        assert_eq!(derive_filename(""), "Resume.pdf");
        assert_eq!(derive_filename("   "), "Resume.pdf");
    }

    #[tokio::test]
    async fn missing_target_is_reported() {
        let page = Document::new(Vec::new());
        let err = exporter().export(&page, "Alex Kim").await.unwrap_err();
        assert!(matches!(err, ExportError::TargetNotFound(id) if id == "resume-preview-print"));
    }

    #[tokio::test]
    async fn screen_preview_alone_is_not_a_target() {
        let mut doc = ResumeDocument::default();
        doc.personal_info.full_name = "Alex Kim".into();
        let page = render_page(&doc);
        let screen = page.find_by_id(SCREEN_PREVIEW_ID).unwrap().clone();
        let page = Document::new(vec![screen.into()]);
        assert!(exporter().export(&page, "Alex Kim").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_elapses_and_live_page_is_untouched() {
        let mut doc = ResumeDocument::default();
        doc.personal_info.full_name = "Alex Kim".into();
        let page = render_page(&doc);
        let before = page.clone();

        let start = tokio::time::Instant::now();
        let report = exporter().export(&page, "Alex Kim").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));

        assert_eq!(report.filename, "Alex_Kim_Resume.pdf");
        assert_eq!(report.page_count, 1);
        assert_eq!(&report.bytes[0..5], b"%PDF-");
        assert_eq!(page, before);
    }
}
