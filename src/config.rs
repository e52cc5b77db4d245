//! Configuration for export and AI generation.
//!
//! Export settings have compiled-in defaults matching US Letter output; a few
//! can be overridden from the environment. AI settings come from the
//! environment only, with `.env` support.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AiError;
use crate::templates::PRINT_TARGET_ID;

/// Points per inch.
pub const PT_PER_IN: f32 = 72.0;

/// Physical page geometry of the output document, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_in: f32,
    pub height_in: f32,
    /// Total margin subtracted from each dimension when fitting the bitmap.
    pub margin_in: f32,
    /// Top-left offset of the placed image.
    pub offset_in: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_in: 8.5,
            height_in: 11.0,
            margin_in: 0.2,
            offset_in: 0.1,
        }
    }
}

impl PageGeometry {
    pub fn width_pt(&self) -> f32 {
        self.width_in * PT_PER_IN
    }

    pub fn height_pt(&self) -> f32 {
        self.height_in * PT_PER_IN
    }

    /// Width the bitmap is scaled to.
    pub fn target_width_in(&self) -> f32 {
        self.width_in - self.margin_in
    }

    /// Height available to one page's slice.
    pub fn usable_height_in(&self) -> f32 {
        self.height_in - self.margin_in
    }
}

/// Settings for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub page: PageGeometry,
    /// Forced width of the capture clone.
    pub print_width_in: f32,
    /// Forced inner padding of the capture clone.
    pub print_padding_in: f32,
    /// Device pixels per CSS pixel.
    pub capture_scale: f32,
    /// Wait before capture so embedded images can decode.
    pub settle_delay: Duration,
    pub print_target_id: String,
    /// Explicit TrueType face; system fonts are probed when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            print_width_in: 8.5,
            print_padding_in: 1.0,
            capture_scale: 2.0,
            settle_delay: Duration::from_millis(500),
            print_target_id: PRINT_TARGET_ID.to_string(),
            font_path: None,
        }
    }
}

impl ExportConfig {
    /// Defaults with `RESUME_FONT` and `RESUME_SETTLE_MS` applied when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("RESUME_FONT") {
            config.font_path = Some(PathBuf::from(path));
        }
        if let Some(ms) = std::env::var("RESUME_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.settle_delay = Duration::from_millis(ms);
        }
        config
    }
}

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Free models tried in order.
pub const DEFAULT_MODELS: &[&str] = &[
    "arcee-ai/trinity-large-preview:free",
    "lfm-2.5-1.2b-thinking:free",
    "molmo-2-8b:free",
    "nemotron-3-nano-30b-a3b:free",
];

/// AI generation settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub models: Vec<String>,
    /// Bound on each backend attempt.
    pub timeout: Duration,
}

impl AiConfig {
    pub fn from_env() -> Result<Self, AiError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::MissingApiKey)?;

        let models = match std::env::var("RESUME_AI_MODELS") {
            Ok(list) => parse_model_list(&list),
            Err(_) => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        if models.is_empty() {
            return Err(AiError::Config("RESUME_AI_MODELS lists no models".into()));
        }

        let timeout_secs = match std::env::var("RESUME_AI_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| AiError::Config(format!("RESUME_AI_TIMEOUT_SECS must be a number, got {v:?}")))?,
            Err(_) => 60,
        };

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| OPENROUTER_BASE_URL.to_string()),
            models,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
