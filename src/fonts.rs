use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, anyhow};
use fontdue::{Font, FontSettings};
use tracing::{debug, info, warn};

use crate::layout::TextMeasure;

pub const TITLE_FONT: &str = "Poppins-Bold.ttf";
pub const BODY_FONT: &str = "Poppins-SemiBold.ttf";

const FONT_URLS: [(&str, &str); 2] = [
    (
        TITLE_FONT,
        "https://github.com/google/fonts/raw/main/ofl/poppins/Poppins-Bold.ttf",
    ),
    (
        BODY_FONT,
        "https://github.com/google/fonts/raw/main/ofl/poppins/Poppins-SemiBold.ttf",
    ),
];

const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Advance of every glyph in the built-in face, as a fraction of the size.
const BUILTIN_ADVANCE: f32 = 0.55;
const BUILTIN_ASCENT: f32 = 0.8;
const BUILTIN_CAP_HEIGHT: f32 = 0.7;

/// A loaded typeface, or the built-in block face used when no font file
/// can be found.
pub enum Face {
    Outline { name: String, font: Font },
    Builtin,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline { name, .. } => write!(f, "Face::Outline({name})"),
            Face::Builtin => write!(f, "Face::Builtin"),
        }
    }
}

impl Face {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font {}: {error}", path.display()))?;
        Ok(Face::Outline {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            font,
        })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin)
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent(&self, size: f32) -> f32 {
        match self {
            Face::Outline { font, .. } => font
                .horizontal_line_metrics(size)
                .map(|m| m.ascent)
                .unwrap_or(size * BUILTIN_ASCENT),
            Face::Builtin => size * BUILTIN_ASCENT,
        }
    }

    pub fn advance(&self, ch: char, size: f32) -> f32 {
        match self {
            Face::Outline { font, .. } => font.metrics(ch, size).advance_width,
            Face::Builtin => size * BUILTIN_ADVANCE,
        }
    }
}

impl TextMeasure for Face {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, size)).sum()
    }

    /// Ink height from the highest glyph top to the lowest glyph bottom.
    fn text_height(&self, text: &str, size: f32) -> f32 {
        match self {
            Face::Outline { font, .. } => {
                let mut top = f32::MIN;
                let mut bottom = f32::MAX;
                for ch in text.chars().filter(|c| !c.is_whitespace()) {
                    let m = font.metrics(ch, size);
                    top = top.max(m.height as f32 + m.ymin as f32);
                    bottom = bottom.min(m.ymin as f32);
                }
                if top < bottom { 0.0 } else { top - bottom }
            }
            Face::Builtin => {
                if text.trim().is_empty() {
                    0.0
                } else {
                    size * BUILTIN_CAP_HEIGHT
                }
            }
        }
    }
}

/// Process-wide font cache keyed by file name.
///
/// The first request for a file resolves it (bundled directory, then a
/// one-time download, then system fonts, then the built-in face); later
/// requests reuse the loaded face. The lock is held while resolving, so
/// concurrent jobs never download the same file twice.
#[derive(Debug)]
pub struct FontCache {
    dir: PathBuf,
    allow_download: bool,
    faces: Mutex<HashMap<String, Arc<Face>>>,
}

impl FontCache {
    pub fn new(dir: impl Into<PathBuf>, allow_download: bool) -> Self {
        Self {
            dir: dir.into(),
            allow_download,
            faces: Mutex::new(HashMap::new()),
        }
    }

    pub fn face(&self, file_name: &str) -> Arc<Face> {
        let mut faces = self.faces.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(face) = faces.get(file_name) {
            return Arc::clone(face);
        }
        let face = Arc::new(self.resolve(file_name));
        faces.insert(file_name.to_string(), Arc::clone(&face));
        face
    }

    fn resolve(&self, file_name: &str) -> Face {
        if let Some(path) = self.ensure_file(file_name) {
            match Face::from_path(&path) {
                Ok(face) => {
                    debug!("Loaded font {}", path.display());
                    return face;
                }
                Err(e) => warn!("Font {} unusable: {:#}", path.display(), e),
            }
        }
        for candidate in SYSTEM_FONTS.iter().map(Path::new).filter(|p| p.exists()) {
            if let Ok(face) = Face::from_path(candidate) {
                info!("Using system font {} in place of {}", candidate.display(), file_name);
                return face;
            }
        }
        warn!("No usable font for {}; falling back to built-in face", file_name);
        Face::Builtin
    }

    /// Path of `file_name` in the font directory, downloading it first if
    /// it is missing and downloads are allowed.
    fn ensure_file(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.dir.join(file_name);
        if path.exists() {
            return Some(path);
        }
        if !self.allow_download {
            debug!("Font {} missing and downloads disabled", path.display());
            return None;
        }
        let url = FONT_URLS
            .iter()
            .find(|(name, _)| *name == file_name)
            .map(|(_, url)| *url)?;
        info!("Downloading font {} from {}", file_name, url);
        match download(url, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Font download failed for {}: {:#}", file_name, e);
                None
            }
        }
    }
}

/// Fetch to a temporary name next to `dest`, then rename into place.
fn download(url: &str, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    let tmp = dest.with_extension(format!("part-{}", std::process::id()));
    fs::write(&tmp, &bytes)?;
    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Faces used by one template: bold title, body text, username caption.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub title: Arc<Face>,
    pub body: Arc<Face>,
    pub caption: Arc<Face>,
}

impl FontSet {
    pub fn load(cache: &FontCache) -> Self {
        let body = cache.face(BODY_FONT);
        Self {
            title: cache.face(TITLE_FONT),
            caption: Arc::clone(&body),
            body,
        }
    }

    pub fn builtin() -> Self {
        let face = Arc::new(Face::Builtin);
        Self {
            title: Arc::clone(&face),
            body: Arc::clone(&face),
            caption: face,
        }
    }
}
