//! # resume-forge – template-driven resumes with paginated PDF export
//!
//! A resume document is rendered through one of a fixed catalog of templates
//! into a structured visual tree. Export then runs these stages:
//!
//! 1. **Locate** – find the hidden print target in the live page ([`export`])
//! 2. **Materialize** – inline literal colours on a detached clone ([`materialize`])
//! 3. **Capture** – style, lay out and paint the clone ([`pipeline`], [`raster`])
//! 4. **Paginate** – cut the bitmap into page bands ([`pagination`])
//! 5. **Assemble** – place each band on a Letter page via printpdf ([`pdf`])
//!
//! [`orchestrator`] is the single entry point the UI calls to download; it
//! owns the busy state and the print fallback. [`ai`] drafts content from a
//! prompt and [`storage`] persists the document between sessions.

pub mod ai;
pub mod canvas;
pub mod catalog;
pub mod colors;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod materialize;
pub mod model;
pub mod orchestrator;
pub mod pagination;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod session;
pub mod storage;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use config::{AiConfig, ExportConfig, PageGeometry};
pub use error::{AiError, ExportError, StorageError};
pub use export::{derive_filename, ExportReport, Exporter};
pub use model::ResumeDocument;
pub use orchestrator::{ExportHost, ExportOrchestrator, ExportOutcome};
pub use session::EditingSession;
