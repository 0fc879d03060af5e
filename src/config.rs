use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

/// Output raster size shared by every stage of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const VERTICAL: Canvas = Canvas {
        width: 1080,
        height: 1920,
    };

    /// Heights of the caption, video and username bands of the classic
    /// layout (30% / 55% / 15%).
    pub fn classic_sections(&self) -> (u32, u32, u32) {
        let h = self.height as f64;
        (
            (h * 0.30) as u32,
            (h * 0.55) as u32,
            (h * 0.15) as u32,
        )
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::VERTICAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateStyle {
    /// Rounded text card over a gradient background.
    #[default]
    Card,
    /// Plain caption band, video, username band on black.
    Classic,
}

impl TemplateStyle {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "classic" => Self::Classic,
            _ => Self::Card,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas: Canvas,
    pub output_dir: PathBuf,
    pub font_dir: PathBuf,
    pub logo_path: Option<PathBuf>,
    pub download_fonts: bool,
    pub default_color1: String,
    pub default_color2: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::VERTICAL,
            output_dir: PathBuf::from("downloads"),
            font_dir: PathBuf::from("assets/fonts"),
            logo_path: Some(PathBuf::from("assets/fonts/logo.png")),
            download_fonts: true,
            default_color1: "#1A1A2E".to_string(),
            default_color2: "#E94560".to_string(),
            groq_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}
