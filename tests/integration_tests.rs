//! Integration tests for the resume export pipeline.
//!
//! These tests validate:
//! - The end-to-end download of a small resume yields one named page
//! - Empty documents never reach rendering
//! - Only one export runs at a time and the busy state always clears
//! - Capture failures and save failures offer the print fallback
//! - Tall resumes tile across several pages
//! - Snapshots survive a round trip through a file store

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use resume_forge::canvas::CanvasBox;
use resume_forge::fonts::FontManager;
use resume_forge::materialize::materialize;
use resume_forge::model::{Experience, ProfilePicture};
use resume_forge::pagination::plan_pages;
use resume_forge::pipeline::{capture_bitmap, capture_layout, prepare_clone};
use resume_forge::storage::{self, FileStore};
use resume_forge::templates::{render, Surface, PRINT_TARGET_ID, SCREEN_PREVIEW_ID};
use resume_forge::{
    EditingSession, ExportConfig, ExportError, ExportHost, ExportOrchestrator, ExportOutcome, Exporter,
    ResumeDocument,
};

// =====================================================================
// Helpers
// =====================================================================

#[derive(Default)]
struct TestHost {
    accept_fallback: bool,
    fail_save: bool,
    busy: Mutex<Vec<bool>>,
    notices: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    saved: Mutex<Vec<(String, usize)>>,
    printed: Mutex<usize>,
}

#[async_trait]
impl ExportHost for TestHost {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), ExportError> {
        if self.fail_save {
            return Err(ExportError::Save("disk full".into()));
        }
        self.saved.lock().unwrap().push((filename.to_string(), bytes.len()));
        Ok(())
    }

    fn set_busy(&self, busy: bool) {
        self.busy.lock().unwrap().push(busy);
    }

    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.accept_fallback
    }

    fn native_print(&self) {
        *self.printed.lock().unwrap() += 1;
    }
}

fn orchestrator() -> ExportOrchestrator {
    ExportOrchestrator::new(Exporter::with_fonts(ExportConfig::default(), FontManager::new()))
}

fn alex_kim(template: u32) -> EditingSession {
    let mut session = EditingSession::new();
    session.select_template(template);
    session.personal_info_mut().full_name = "Alex Kim".into();
    let id = session.document().experiences[0].id.clone();
    session.update_experience(&id, |e| {
        e.position = "Engineer".into();
        e.company = "Acme".into();
        e.start_date = "2018".into();
        e.end_date = "2020".into();
        e.current = true;
    });
    session
}

fn png_data_uri() -> String {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 120, 200]));
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64_STD.encode(png.into_inner()))
}

fn border_colors(b: &CanvasBox, out: &mut Vec<[u8; 4]>) {
    if let Some(border) = &b.border {
        out.push(border.color);
    }
    for c in &b.children {
        border_colors(c, out);
    }
}

// =====================================================================
// End to end
// =====================================================================

#[tokio::test(start_paused = true)]
async fn alex_kim_downloads_as_one_named_page() {
    let session = alex_kim(1);

    let page = session.render_page();
    let preview = page.find_by_id(SCREEN_PREVIEW_ID).unwrap().text_content();
    assert!(preview.contains("Engineer"));
    assert!(preview.contains("Acme"));
    assert!(preview.contains("2018 - Present"));
    assert!(!preview.contains("2020"));

    let host = TestHost::default();
    let outcome = orchestrator().on_download_requested(&session, &host).await;

    let ExportOutcome::Saved(report) = outcome else {
        panic!("expected a saved document, got {outcome:?}");
    };
    assert_eq!(report.filename, "Alex_Kim_Resume.pdf");
    assert_eq!(report.page_count, 1);
    assert_eq!(&report.bytes[0..5], b"%PDF-");
    assert_eq!(
        *host.saved.lock().unwrap(),
        vec![("Alex_Kim_Resume.pdf".to_string(), report.bytes.len())]
    );
    assert_eq!(*host.busy.lock().unwrap(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn every_template_fits_a_short_resume_on_one_page() {
    for id in 1..=6 {
        let host = TestHost::default();
        let outcome = orchestrator().on_download_requested(&alex_kim(id), &host).await;
        match outcome {
            ExportOutcome::Saved(report) => assert_eq!(report.page_count, 1, "template {id}"),
            other => panic!("template {id}: {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn photo_template_exports_with_a_real_image() {
    let mut session = alex_kim(2);
    assert!(session.set_profile_picture(ProfilePicture::from_data_uri(png_data_uri())));

    let host = TestHost::default();
    let outcome = orchestrator().on_download_requested(&session, &host).await;
    assert!(matches!(outcome, ExportOutcome::Saved(_)), "{outcome:?}");
}

// =====================================================================
// Preconditions and single flight
// =====================================================================

#[tokio::test]
async fn blank_document_asks_for_details() {
    let host = TestHost::default();
    let outcome = orchestrator()
        .on_download_requested(&EditingSession::new(), &host)
        .await;

    assert!(matches!(outcome, ExportOutcome::NeedsContent));
    assert_eq!(
        *host.notices.lock().unwrap(),
        vec!["Please fill in your resume details before downloading."]
    );
    assert!(host.busy.lock().unwrap().is_empty());
    assert!(host.saved.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_request_during_an_export_is_turned_away() {
    let orch = orchestrator();
    let session = alex_kim(1);
    let host = TestHost::default();

    let (first, second) = tokio::join!(
        orch.on_download_requested(&session, &host),
        orch.on_download_requested(&session, &host),
    );

    assert!(matches!(first, ExportOutcome::Saved(_)));
    assert!(matches!(second, ExportOutcome::AlreadyRunning));
    assert_eq!(host.saved.lock().unwrap().len(), 1);
    assert_eq!(*host.busy.lock().unwrap(), vec![true, false]);
    assert!(!orch.is_running());

    // The flag is released, so a later request runs normally.
    let third = orch.on_download_requested(&session, &host).await;
    assert!(matches!(third, ExportOutcome::Saved(_)));
}

// =====================================================================
// Failure paths
// =====================================================================

fn broken_photo_session() -> EditingSession {
    let mut session = alex_kim(2);
    session.set_profile_picture(ProfilePicture::from_data_uri("data:image/png;base64,AAAA"));
    session
}

#[tokio::test(start_paused = true)]
async fn capture_failure_offers_print_and_clears_busy() {
    let host = TestHost {
        accept_fallback: true,
        ..TestHost::default()
    };
    let orch = orchestrator();
    let outcome = orch.on_download_requested(&broken_photo_session(), &host).await;

    assert!(matches!(outcome, ExportOutcome::FellBackToPrint));
    assert_eq!(*host.printed.lock().unwrap(), 1);
    let prompts = host.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Error generating PDF: image error:"));
    assert!(prompts[0].contains("Would you like to use your browser's print function instead?"));
    assert_eq!(*host.busy.lock().unwrap(), vec![true, false]);
    assert!(host.saved.lock().unwrap().is_empty());
    assert!(!orch.is_running());
}

#[tokio::test(start_paused = true)]
async fn declining_the_fallback_leaves_ui_ready() {
    let host = TestHost::default();
    let orch = orchestrator();
    let outcome = orch.on_download_requested(&broken_photo_session(), &host).await;

    assert!(matches!(outcome, ExportOutcome::Declined));
    assert_eq!(*host.printed.lock().unwrap(), 0);
    assert_eq!(*host.busy.lock().unwrap(), vec![true, false]);
    assert!(!orch.is_running());
}

#[tokio::test(start_paused = true)]
async fn save_failure_also_offers_print() {
    let host = TestHost {
        fail_save: true,
        accept_fallback: true,
        ..TestHost::default()
    };
    let outcome = orchestrator().on_download_requested(&alex_kim(1), &host).await;

    assert!(matches!(outcome, ExportOutcome::FellBackToPrint));
    assert!(host.prompts.lock().unwrap()[0].starts_with("Error generating PDF: save failed: disk full"));
}

// =====================================================================
// Capture and pagination
// =====================================================================

#[test]
fn materialized_clone_carries_accent_colours() {
    let session = alex_kim(1);
    let config = ExportConfig::default();
    let fonts = FontManager::new();
    let page = session.render_page();
    let target = page.find_by_id(PRINT_TARGET_ID).unwrap();

    let plain = prepare_clone(target, &config);
    let mut inlined = plain.clone();
    assert!(materialize(&mut inlined) > 0);

    let purple_300 = [216, 180, 254, 255];
    let mut before = Vec::new();
    border_colors(&capture_layout(&plain, &config, &fonts).unwrap().root, &mut before);
    let mut after = Vec::new();
    border_colors(&capture_layout(&inlined, &config, &fonts).unwrap().root, &mut after);

    assert!(!before.contains(&purple_300));
    assert!(after.contains(&purple_300));
    // The live page is not affected by materializing its clone.
    assert_eq!(page, session.render_page());
}

#[tokio::test(start_paused = true)]
async fn tall_resume_spans_several_pages() {
    let mut doc = alex_kim(1).into_document();
    doc.experiences = (0..40)
        .map(|i| Experience {
            position: format!("Engineer {i}"),
            company: "Acme".into(),
            start_date: "2018".into(),
            end_date: "2020".into(),
            description: "Shipped things.\nFixed things.\nMeasured things.".into(),
            ..Experience::default()
        })
        .collect();
    let session = EditingSession::from_document(doc);

    let config = ExportConfig::default();
    let exporter = Exporter::with_fonts(config.clone(), FontManager::new());
    let report = exporter
        .export(&session.render_page(), session.document().full_name())
        .await
        .unwrap();
    assert!(report.page_count >= 2, "only {} page(s)", report.page_count);

    // Page count is ceil(H / C) for the captured bitmap.
    let page = session.render_page();
    let mut clone = prepare_clone(page.find_by_id(PRINT_TARGET_ID).unwrap(), &config);
    materialize(&mut clone);
    let bitmap = capture_bitmap(&clone, &config, exporter.fonts()).unwrap();
    let plan = plan_pages(bitmap.width(), bitmap.height(), config.page).unwrap();
    assert_eq!(report.page_count, bitmap.height().div_ceil(plan.capacity_rows) as usize);
    assert_eq!(plan.bands.last().map(|b| b.end()), Some(bitmap.height()));
}

#[test]
fn print_and_screen_surfaces_match() {
    let session = alex_kim(4);
    let doc = session.document();
    assert_eq!(
        render(doc, 4, Surface::Print).text_content(),
        render(doc, 4, Surface::Screen).text_content()
    );
}

// =====================================================================
// Storage
// =====================================================================

#[test]
fn snapshot_round_trips_through_a_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let mut session = alex_kim(3);
    session.set_summary("Builds reliable systems.");
    session.add_skill();
    let saved = session.document().clone();
    storage::save(&store, &saved).unwrap();
    assert!(dir.path().join("resumeData.json").exists());

    let mut restored = ResumeDocument::default();
    assert!(storage::load_into(&store, &mut restored).unwrap());
    assert_eq!(restored, saved);
}
