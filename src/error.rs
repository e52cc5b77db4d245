//! Error types, one enum per failure domain.

use std::path::PathBuf;

use thiserror::Error;

/// Anything that can go wrong between locating the print target and handing
/// the finished document to the host. The orchestrator absorbs all of these.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("print target `{0}` not found")]
    TargetNotFound(String),

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("save failed: {0}")]
    Save(String),
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to parse font: {0}")]
    Parse(String),

    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("model returned empty content")]
    EmptyContent,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("API key is missing")]
    MissingApiKey,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("All models failed. Details:\n{}", .0.join("\n"))]
    AllFailed(Vec<String>),
}
