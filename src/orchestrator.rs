//! Export orchestrator – the single entry point the editing UI calls to
//! download a PDF.
//!
//! It checks the document is worth exporting, keeps at most one export in
//! flight, keeps the download control busy for exactly as long as the
//! export runs, and converts every export failure into an offer to use the
//! platform's print dialog instead.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::{error, info, warn};

use crate::error::ExportError;
use crate::export::{ExportReport, Exporter};
use crate::session::EditingSession;

pub const EMPTY_DOCUMENT_NOTICE: &str = "Please fill in your resume details before downloading.";

/// The UI collaborator an export reports to.
#[async_trait]
pub trait ExportHost: Send + Sync {
    /// Hand the finished document to the user (download, file write, ...).
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), ExportError>;

    /// Mark the download control busy or ready.
    fn set_busy(&self, busy: bool);

    /// Show an informational notice.
    fn notify(&self, message: &str);

    /// Ask a yes/no question; true means OK.
    fn confirm(&self, message: &str) -> bool;

    /// Open the platform print dialog.
    fn native_print(&self);
}

/// How a download request ended.
#[derive(Debug)]
pub enum ExportOutcome {
    Saved(ExportReport),
    /// Nothing to export; the user was told to fill in details.
    NeedsContent,
    /// Another export is still running.
    AlreadyRunning,
    /// Export failed and the user chose the print dialog.
    FellBackToPrint,
    /// Export failed and the user chose to retry later.
    Declined,
}

pub fn fallback_prompt(err: &ExportError) -> String {
    format!(
        "Error generating PDF: {err}\n\nWould you like to use your browser's print function instead? \
         (Press OK to print, or Cancel to try again)"
    )
}

pub struct ExportOrchestrator {
    exporter: Exporter,
    in_flight: AtomicBool,
}

impl ExportOrchestrator {
    pub fn new(exporter: Exporter) -> Self {
        Self {
            exporter,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Handle one click on the download control.
    pub async fn on_download_requested(
        &self,
        session: &EditingSession,
        host: &dyn ExportHost,
    ) -> ExportOutcome {
        let doc = session.document();
        if doc.is_export_empty() {
            host.notify(EMPTY_DOCUMENT_NOTICE);
            return ExportOutcome::NeedsContent;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("export requested while another is running");
            return ExportOutcome::AlreadyRunning;
        }
        let _guard = BusyGuard::engage(host, &self.in_flight);

        let live = session.render_page();
        let result = match self.exporter.export(&live, doc.full_name()).await {
            Ok(report) => {
                let saved = host.save(&report.filename, &report.bytes).await;
                saved.map(|()| report)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                info!("saved {} ({} page(s))", report.filename, report.page_count);
                ExportOutcome::Saved(report)
            }
            Err(e) => {
                error!("Error generating PDF: {e}");
                if host.confirm(&fallback_prompt(&e)) {
                    host.native_print();
                    ExportOutcome::FellBackToPrint
                } else {
                    ExportOutcome::Declined
                }
            }
        }
    }
}

/// Marks the host busy and releases both the busy state and the in-flight
/// flag on every exit path.
struct BusyGuard<'a> {
    host: &'a dyn ExportHost,
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn engage(host: &'a dyn ExportHost, flag: &'a AtomicBool) -> Self {
        host.set_busy(true);
        Self { host, flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.host.set_busy(false);
        self.flag.store(false, Ordering::Release);
    }
}
